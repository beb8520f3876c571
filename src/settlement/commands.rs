/// 정산 커맨드 처리
/// 1. 경매 종료 (낙찰자 확정)
/// 2. 경매 취소 (낙찰자 없음)
/// OPEN -> CLOSED 전이는 단 한 번만 일어나며, 종료 여부는 트랜잭션 내부에서 읽어
/// 동시 정산 요청에 의한 이중 정산을 차단한다.
// region:    --- Imports
use crate::bidding::model::Item;
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use crate::query::queries;
use chrono::{DateTime, Utc};
use tracing::info;

// endregion: --- Imports

// region:    --- Commands

/// 정산 명령 (종료/취소 공용)
#[derive(Debug, Clone)]
pub struct CloseAuctionCommand {
    pub item_id: i64,
    pub owner_uid: String,
    pub end_time: DateTime<Utc>,
}

/// 경매 종료 결과
/// winner_uid 가 있으면 커밋 이후 낙찰 알림 대상이다.
#[derive(Debug)]
pub struct SettledAuction {
    pub winner_uid: Option<String>,
    pub winning_amount: f64,
    pub item_title: String,
}

/// 경매 종료
/// 낙찰 금액은 유효 현재 가격이며, 해당 금액의 입찰 기록에서 낙찰자를 복원한다.
/// 입찰이 없었다면 낙찰자 없이 종료된다.
pub async fn end_auction(
    db_manager: &DatabaseManager,
    cmd: CloseAuctionCommand,
) -> Result<SettledAuction, AuctionError> {
    info!("{:<12} --> 경매 종료 처리 시작: {:?}", "Settlement", cmd);

    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                let item = lock_owned_open_item(tx, cmd.item_id, &cmd.owner_uid).await?;

                let winning_amount = item.effective_current_bid();

                // 낙찰 금액과 일치하는 입찰 기록에서 낙찰자 복원
                // 동액 입찰은 거부되므로 해당 금액의 입찰은 많아야 하나다.
                let winner_uid: Option<String> = sqlx::query_scalar(
                    "SELECT user_id FROM bids
                     WHERE item_id = $1 AND bid_amount = $2
                     ORDER BY bid_time
                     LIMIT 1",
                )
                .bind(cmd.item_id)
                .bind(winning_amount)
                .fetch_optional(&mut **tx)
                .await?;

                // 전체 입찰 비활성화
                sqlx::query("UPDATE bids SET is_active = FALSE WHERE item_id = $1")
                    .bind(cmd.item_id)
                    .execute(&mut **tx)
                    .await?;

                // 낙찰자와 함께 종료 처리
                sqlx::query(
                    "UPDATE items
                     SET is_closed = TRUE, end_at = $1, final_winning_amount = $2,
                         winner_uid = $3, leading_bid_id = NULL
                     WHERE id = $4",
                )
                .bind(cmd.end_time)
                .bind(winning_amount)
                .bind(&winner_uid)
                .bind(cmd.item_id)
                .execute(&mut **tx)
                .await?;

                info!(
                    "{:<12} --> 경매 종료: item_id={}, 낙찰자={:?}, 낙찰가={}",
                    "Settlement", cmd.item_id, winner_uid, winning_amount
                );

                Ok(SettledAuction {
                    winner_uid,
                    winning_amount,
                    item_title: item.title,
                })
            })
        })
        .await
}

/// 경매 취소
/// 모든 입찰을 비활성화하고 낙찰자 없이 종료한다. 알림은 보내지 않는다.
pub async fn cancel_auction(
    db_manager: &DatabaseManager,
    cmd: CloseAuctionCommand,
) -> Result<(), AuctionError> {
    info!("{:<12} --> 경매 취소 처리 시작: {:?}", "Settlement", cmd);

    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                lock_owned_open_item(tx, cmd.item_id, &cmd.owner_uid).await?;

                // 전체 입찰 비활성화
                sqlx::query("UPDATE bids SET is_active = FALSE WHERE item_id = $1")
                    .bind(cmd.item_id)
                    .execute(&mut **tx)
                    .await?;

                // 낙찰자 없이 종료 처리
                sqlx::query(
                    "UPDATE items
                     SET is_closed = TRUE, end_at = $1, final_winning_amount = NULL,
                         winner_uid = NULL, leading_bid_id = NULL
                     WHERE id = $2",
                )
                .bind(cmd.end_time)
                .bind(cmd.item_id)
                .execute(&mut **tx)
                .await?;

                info!("{:<12} --> 경매 취소: item_id={}", "Settlement", cmd.item_id);

                Ok(())
            })
        })
        .await
}

/// 정산 공통 전제 검사
/// 상품 행을 FOR UPDATE 로 잠근 뒤 소유자 확인과 종료 여부를 검사한다.
/// 소유자가 아닌 경우 상품 존재 여부를 노출하지 않는다.
async fn lock_owned_open_item(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    item_id: i64,
    owner_uid: &str,
) -> Result<Item, AuctionError> {
    let item = sqlx::query_as::<_, Item>(queries::GET_ITEM_FOR_UPDATE)
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AuctionError::NotOwned)?;

    if item.uid != owner_uid {
        return Err(AuctionError::NotOwned);
    }
    if item.is_closed {
        return Err(AuctionError::AlreadyClosed);
    }

    Ok(item)
}

// endregion: --- Commands
