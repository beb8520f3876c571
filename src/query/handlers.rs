// region:    --- Imports
use super::queries;
use crate::bidding::model::{Bid, Item};
use crate::database::DatabaseManager;
use sqlx::Error as SqlxError;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 상품 조회
pub async fn get_item(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<Item>, SqlxError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 상품 조회
pub async fn get_all_items(db_manager: &DatabaseManager) -> Result<Vec<Item>, SqlxError> {
    info!("{:<12} --> 모든 상품 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Item>(queries::GET_ALL_ITEMS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 입찰 이력 조회
pub async fn get_item_bids(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 상품 입찰 이력 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_ITEM_BIDS)
                    .bind(item_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 사용자 입찰 조회
pub async fn get_user_bids(
    db_manager: &DatabaseManager,
    uid: String,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 사용자 입찰 조회 uid: {}", "Query", uid);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_USER_BIDS)
                    .bind(uid)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 사용자 활성 입찰 수 조회
pub async fn count_active_bids(
    db_manager: &DatabaseManager,
    uid: String,
) -> Result<i64, SqlxError> {
    info!("{:<12} --> 활성 입찰 수 조회 uid: {}", "Query", uid);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_scalar::<_, i64>(queries::COUNT_ACTIVE_BIDS_BY_USER)
                    .bind(uid)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
