/// 상품 조회
pub const GET_ITEM: &str = "SELECT id, uid, title, description, image_url, item_category, seller_display_name, starting_bid, current_bid, leading_bid_id, is_closed, end_at, final_winning_amount, winner_uid, created_at FROM items WHERE id = $1";

/// 상품 조회 (행 잠금)
/// 동일 상품에 대한 입찰과 정산을 직렬화한다.
pub const GET_ITEM_FOR_UPDATE: &str = "SELECT id, uid, title, description, image_url, item_category, seller_display_name, starting_bid, current_bid, leading_bid_id, is_closed, end_at, final_winning_amount, winner_uid, created_at FROM items WHERE id = $1 FOR UPDATE";

/// 모든 상품 조회
pub const GET_ALL_ITEMS: &str = "SELECT id, uid, title, description, image_url, item_category, seller_display_name, starting_bid, current_bid, leading_bid_id, is_closed, end_at, final_winning_amount, winner_uid, created_at FROM items ORDER BY created_at DESC";

/// 상품 입찰 이력 조회 (금액 내림차순, 동시각은 시간 오름차순)
pub const GET_ITEM_BIDS: &str = r#"
    SELECT id, item_id, user_id, bid_amount, bid_time, is_active, item_title
    FROM bids
    WHERE item_id = $1
    ORDER BY bid_amount DESC, bid_time ASC
"#;

/// 사용자 입찰 조회
pub const GET_USER_BIDS: &str = r#"
    SELECT id, item_id, user_id, bid_amount, bid_time, is_active, item_title
    FROM bids
    WHERE user_id = $1
    ORDER BY bid_time DESC
"#;

/// 사용자 활성 입찰 수 조회
pub const COUNT_ACTIVE_BIDS_BY_USER: &str =
    "SELECT COUNT(*) FROM bids WHERE user_id = $1 AND is_active = TRUE";

/// 수신자 연락처 조회
pub const GET_USER_CONTACT: &str = "SELECT email, display_name FROM users WHERE uid = $1";
