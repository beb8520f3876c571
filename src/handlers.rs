// region:    --- Imports
use crate::bidding::commands::{place_bid, PlaceBidCommand};
use crate::database::DatabaseManager;
use crate::error::{AuctionError, BidPathError};
use crate::notification::{Notification, Notifier};
use crate::query;
use crate::settlement::commands::{cancel_auction, end_auction, CloseAuctionCommand};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

pub type AppState = (Arc<DatabaseManager>, Notifier);

// region:    --- Requests

/// 입찰 요청
/// 필드 존재 여부와 형식은 트랜잭션을 열기 전에 검증한다.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidRequest {
    pub item_id: Option<String>,
    pub uid: Option<String>,
    pub bid_amount: Option<serde_json::Value>,
}

/// 정산 요청 (종료/취소 공용)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseAuctionRequest {
    pub item_id: Option<String>,
    pub uid: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UidQuery {
    pub uid: Option<String>,
}

// endregion: --- Requests

// region:    --- Boundary Validation

/// 상품 ID 파싱: 잘못된 형식은 트랜잭션 이전에 400 으로 거부
fn parse_item_id(raw: Option<&str>) -> Result<i64, AuctionError> {
    let raw = raw.ok_or_else(|| AuctionError::InvalidInput("itemId가 필요합니다".to_string()))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AuctionError::InvalidInput("잘못된 상품 ID 형식입니다".to_string()))
}

/// 입찰 금액 파싱: 숫자(또는 숫자 문자열)이며 0보다 커야 한다
fn parse_bid_amount(raw: Option<&serde_json::Value>) -> Result<f64, AuctionError> {
    let raw =
        raw.ok_or_else(|| AuctionError::InvalidInput("bidAmount가 필요합니다".to_string()))?;
    let amount = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AuctionError::InvalidInput("잘못된 입찰 금액입니다".to_string()))?;

    if !amount.is_finite() || amount <= 0.0 {
        return Err(AuctionError::InvalidInput(
            "잘못된 입찰 금액입니다".to_string(),
        ));
    }
    Ok(amount)
}

/// 종료 시각 파싱 (RFC 3339)
fn parse_end_time(raw: Option<&str>) -> Result<DateTime<Utc>, AuctionError> {
    let raw = raw.ok_or_else(|| AuctionError::InvalidInput("endTime이 필요합니다".to_string()))?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|_| AuctionError::InvalidInput("잘못된 endTime 형식입니다".to_string()))
}

fn require_uid(raw: Option<String>) -> Result<String, AuctionError> {
    match raw {
        Some(uid) if !uid.trim().is_empty() => Ok(uid),
        _ => Err(AuctionError::InvalidInput("uid가 필요합니다".to_string())),
    }
}

// endregion: --- Boundary Validation

// region:    --- Command Handlers

/// 입찰 요청 처리
/// 입찰 경로의 실패는 호출 지점 관례에 따라 400 으로 보고된다.
pub async fn handle_place_bid(
    State((db_manager, notifier)): State<AppState>,
    Json(req): Json<PlaceBidRequest>,
) -> Result<impl IntoResponse, BidPathError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Handler", req);

    let bid_amount = parse_bid_amount(req.bid_amount.as_ref())?;
    let item_id = parse_item_id(req.item_id.as_deref())?;
    let uid = require_uid(req.uid)?;

    let placed = place_bid(
        &db_manager,
        PlaceBidCommand {
            item_id,
            uid,
            bid_amount,
        },
    )
    .await?;

    // 커밋 이후에만 상위 입찰 알림을 적재한다
    if let Some(outbid_user) = placed.outbid_user {
        notifier.notify(Notification::Outbid {
            user_id: outbid_user,
            item_title: placed.item_title,
            new_bid_amount: bid_amount,
        });
    }

    Ok(Json(json!({
        "message": "입찰이 성공적으로 처리되었습니다.",
        "bidId": placed.bid_id,
        "updated": 1
    })))
}

/// 경매 취소 요청 처리
pub async fn handle_cancel_auction(
    State((db_manager, _)): State<AppState>,
    Json(req): Json<CloseAuctionRequest>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 취소 요청 처리 시작: {:?}", "Handler", req);

    let item_id = parse_item_id(req.item_id.as_deref())?;
    let uid = require_uid(req.uid)?;
    let end_time = parse_end_time(req.end_time.as_deref())?;

    cancel_auction(
        &db_manager,
        CloseAuctionCommand {
            item_id,
            owner_uid: uid,
            end_time,
        },
    )
    .await?;

    Ok(Json(json!({
        "message": "경매가 성공적으로 취소되었습니다."
    })))
}

/// 경매 종료 요청 처리
pub async fn handle_end_auction(
    State((db_manager, notifier)): State<AppState>,
    Json(req): Json<CloseAuctionRequest>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 종료 요청 처리 시작: {:?}", "Handler", req);

    let item_id = parse_item_id(req.item_id.as_deref())?;
    let uid = require_uid(req.uid)?;
    let end_time = parse_end_time(req.end_time.as_deref())?;

    let settled = end_auction(
        &db_manager,
        CloseAuctionCommand {
            item_id,
            owner_uid: uid,
            end_time,
        },
    )
    .await?;

    // 낙찰자가 있는 경우에만 커밋 이후 알림을 적재한다
    if let Some(winner_uid) = settled.winner_uid.clone() {
        notifier.notify(Notification::Winner {
            user_id: winner_uid,
            item_title: settled.item_title.clone(),
            winning_bid: settled.winning_amount,
        });
    }

    Ok(Json(json!({
        "message": "경매가 성공적으로 종료되었습니다.",
        "winnerUid": settled.winner_uid,
        "highestBid": settled.winning_amount
    })))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 사용자 활성 입찰 수 조회
pub async fn handle_get_active_bid_count(
    State((db_manager, _)): State<AppState>,
    Query(params): Query<UidQuery>,
) -> Result<impl IntoResponse, AuctionError> {
    let uid = require_uid(params.uid)?;
    info!("{:<12} --> 활성 입찰 수 조회 uid: {}", "Handler", uid);

    let count = query::handlers::count_active_bids(&db_manager, uid).await?;
    Ok(Json(json!({ "count": count })))
}

/// 사용자 입찰 조회
pub async fn handle_get_user_bids(
    State((db_manager, _)): State<AppState>,
    Query(params): Query<UidQuery>,
) -> Result<impl IntoResponse, AuctionError> {
    let uid = require_uid(params.uid)?;
    info!("{:<12} --> 사용자 입찰 조회 uid: {}", "Handler", uid);

    let bids = query::handlers::get_user_bids(&db_manager, uid).await?;
    Ok(Json(bids))
}

/// 모든 상품 조회
pub async fn handle_get_items(
    State((db_manager, _)): State<AppState>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 모든 상품 조회", "Handler");
    let items = query::handlers::get_all_items(&db_manager).await?;
    Ok(Json(items))
}

/// 상품 조회
pub async fn handle_get_item(
    State((db_manager, _)): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 상품 조회 id: {}", "Handler", item_id);
    let item = query::handlers::get_item(&db_manager, item_id)
        .await?
        .ok_or(AuctionError::ItemNotFound)?;
    Ok(Json(item))
}

/// 상품 입찰 이력 조회
pub async fn handle_get_item_bids(
    State((db_manager, _)): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 상품 입찰 이력 조회 id: {}", "Handler", item_id);
    let bids = query::handlers::get_item_bids(&db_manager, item_id).await?;
    Ok(Json(bids))
}

// endregion: --- Query Handlers

// region:    --- Tests


// endregion: --- Tests
