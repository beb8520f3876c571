// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Auction Error

/// 도메인 오류 분류
/// 모든 비즈니스 규칙 위반은 트랜잭션 내부에서 발생하여 커밋 전에 롤백된다.
#[derive(Debug, Error)]
pub enum AuctionError {
    /// 필수 필드 누락, 숫자가 아닌 금액, 잘못된 식별자 형식 등
    #[error("잘못된 요청입니다: {0}")]
    InvalidInput(String),

    /// 존재하지 않는 상품
    #[error("상품을 찾을 수 없습니다.")]
    ItemNotFound,

    /// 요청자가 상품 소유자가 아님 (존재 여부를 노출하지 않는다)
    #[error("상품이 없거나 소유자가 아닙니다.")]
    NotOwned,

    /// 이미 종료된 경매에 대한 입찰
    #[error("경매가 이미 종료되었습니다.")]
    AuctionClosed,

    /// 이미 종료된 경매에 대한 정산 요청
    #[error("이미 종료된 경매입니다.")]
    AlreadyClosed,

    /// 입찰 금액이 현재 가격 이하
    #[error("입찰 금액은 현재 가격 ${current_bid}보다 높아야 합니다.")]
    BidTooLow { current_bid: f64 },

    /// 사용자당 활성 입찰 수 제한(5개) 초과
    #[error("동시에 5개를 초과하는 활성 입찰을 가질 수 없습니다.")]
    BidLimitExceeded,

    /// 저장소/트랜잭션 오류
    #[error("내부 서버 오류")]
    Store(#[from] sqlx::Error),
}

impl AuctionError {
    /// 클라이언트용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::InvalidInput(_) => "INVALID_INPUT",
            AuctionError::ItemNotFound => "ITEM_NOT_FOUND",
            AuctionError::NotOwned => "NOT_OWNED",
            AuctionError::AuctionClosed => "AUCTION_CLOSED",
            AuctionError::AlreadyClosed => "ALREADY_CLOSED",
            AuctionError::BidTooLow { .. } => "BID_TOO_LOW",
            AuctionError::BidLimitExceeded => "BID_LIMIT_EXCEEDED",
            AuctionError::Store(_) => "STORE_ERROR",
        }
    }

    /// HTTP 상태 코드 매핑
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::InvalidInput(_)
            | AuctionError::AuctionClosed
            | AuctionError::AlreadyClosed
            | AuctionError::BidTooLow { .. }
            | AuctionError::BidLimitExceeded => StatusCode::BAD_REQUEST,
            AuctionError::ItemNotFound | AuctionError::NotOwned => StatusCode::NOT_FOUND,
            AuctionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 클라이언트용 오류 본문
    fn body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        // 재시도를 위해 현재 가격을 페이로드에 포함
        if let AuctionError::BidTooLow { current_bid } = self {
            body["current_bid"] = serde_json::json!(current_bid);
        }
        body
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

// endregion: --- Auction Error

// region:    --- Bid Path Error

/// 입찰 경로 오류 래퍼
/// 원본 API 의 입찰 호출 지점은 저장소 오류를 제외한 모든 실패를
/// (존재하지 않는 상품 포함) 400 으로 보고한다.
pub struct BidPathError(pub AuctionError);

impl From<AuctionError> for BidPathError {
    fn from(err: AuctionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BidPathError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuctionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(self.0.body())).into_response()
    }
}

// endregion: --- Bid Path Error

// region:    --- Tests


// endregion: --- Tests
