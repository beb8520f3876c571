/// 입찰 커맨드 처리
/// 검증과 기록을 하나의 트랜잭션으로 묶어 동시 입찰을 직렬화한다.
// region:    --- Imports
use crate::bidding::model::Item;
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use crate::query::queries;
use chrono::Utc;
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Clone)]
pub struct PlaceBidCommand {
    pub item_id: i64,
    pub uid: String,
    pub bid_amount: f64,
}

/// 입찰 처리 결과
/// outbid_user 는 커밋 이후 상위 입찰 알림 대상이다.
#[derive(Debug)]
pub struct PlacedBid {
    pub bid_id: i64,
    pub item_title: String,
    pub outbid_user: Option<String>,
}

/// 사용자당 허용되는 활성 입찰 수 상한
pub const MAX_ACTIVE_BIDS_PER_USER: i64 = 5;

/// 입찰 처리
/// 검증 순서: 상품 존재 -> 종료 여부 -> 활성 입찰 수 상한 -> 금액 비교.
/// 상품 행을 FOR UPDATE 로 잠가 동일 상품에 대한 입찰과 정산을 직렬화하고,
/// 사용자 단위 advisory lock 으로 상한 검사와 삽입 사이의 경쟁을 차단한다.
pub async fn place_bid(
    db_manager: &DatabaseManager,
    cmd: PlaceBidCommand,
) -> Result<PlacedBid, AuctionError> {
    info!("{:<12} --> 입찰 처리 시작: {:?}", "Command", cmd);

    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                // 동일 사용자의 동시 입찰 직렬화
                sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                    .bind(&cmd.uid)
                    .execute(&mut **tx)
                    .await?;

                // 상품 행 잠금
                let item = sqlx::query_as::<_, Item>(queries::GET_ITEM_FOR_UPDATE)
                    .bind(cmd.item_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(AuctionError::ItemNotFound)?;

                if item.is_closed {
                    return Err(AuctionError::AuctionClosed);
                }

                // 전체 상품에 걸친 활성 입찰 수 상한 검사
                let active_bids: i64 = sqlx::query_scalar(queries::COUNT_ACTIVE_BIDS_BY_USER)
                    .bind(&cmd.uid)
                    .fetch_one(&mut **tx)
                    .await?;
                if active_bids >= MAX_ACTIVE_BIDS_PER_USER {
                    return Err(AuctionError::BidLimitExceeded);
                }

                // 잠금 이후 커밋된 현재 가격과 비교 (동액 입찰은 거부)
                let current_bid = item.effective_current_bid();
                if cmd.bid_amount <= current_bid {
                    return Err(AuctionError::BidTooLow { current_bid });
                }

                // 밀려나는 기존 최고 입찰자 식별 (알림 대상)
                let outbid_user: Option<String> = sqlx::query_scalar(
                    "SELECT user_id FROM bids
                     WHERE item_id = $1 AND is_active = TRUE AND user_id <> $2
                     LIMIT 1",
                )
                .bind(cmd.item_id)
                .bind(&cmd.uid)
                .fetch_optional(&mut **tx)
                .await?;

                // 새 입찰 기록
                let bid_id: i64 = sqlx::query_scalar(
                    "INSERT INTO bids (item_id, user_id, bid_amount, bid_time, is_active, item_title)
                     VALUES ($1, $2, $3, $4, TRUE, $5)
                     RETURNING id",
                )
                .bind(cmd.item_id)
                .bind(&cmd.uid)
                .bind(cmd.bid_amount)
                .bind(Utc::now())
                .bind(&item.title)
                .fetch_one(&mut **tx)
                .await?;

                // 현재 가격 및 선두 입찰 갱신
                sqlx::query("UPDATE items SET current_bid = $1, leading_bid_id = $2 WHERE id = $3")
                    .bind(cmd.bid_amount)
                    .bind(bid_id)
                    .bind(cmd.item_id)
                    .execute(&mut **tx)
                    .await?;

                // 새 입찰을 제외한 모든 활성 입찰 비활성화 (상품당 활성 입찰 1개 유지)
                sqlx::query(
                    "UPDATE bids SET is_active = FALSE
                     WHERE item_id = $1 AND is_active = TRUE AND id <> $2",
                )
                .bind(cmd.item_id)
                .bind(bid_id)
                .execute(&mut **tx)
                .await?;

                info!(
                    "{:<12} --> 입찰 성공: item_id={}, bid_id={}, 금액={}",
                    "Command", cmd.item_id, bid_id, cmd.bid_amount
                );

                Ok(PlacedBid {
                    bid_id,
                    item_title: item.title,
                    outbid_user,
                })
            })
        })
        .await
}

// endregion: --- Commands
