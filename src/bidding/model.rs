use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 상품 모델
// winningBid 필드를 진행 중(leading_bid_id)과 종료 후(final_winning_amount)로 분리
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub item_category: String,
    pub seller_display_name: String,
    pub starting_bid: f64,
    pub current_bid: Option<f64>,
    pub leading_bid_id: Option<i64>,
    pub is_closed: bool,
    pub end_at: DateTime<Utc>,
    pub final_winning_amount: Option<f64>,
    pub winner_uid: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// 유효 현재 가격: 새 입찰이 반드시 초과해야 하는 하한
    pub fn effective_current_bid(&self) -> f64 {
        self.current_bid.unwrap_or(self.starting_bid)
    }
}

// 입찰 모델
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: i64,
    pub item_id: i64,
    pub user_id: String,
    pub bid_amount: f64,
    pub bid_time: DateTime<Utc>,
    pub is_active: bool,
    pub item_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(starting_bid: f64, current_bid: Option<f64>) -> Item {
        Item {
            id: 1,
            uid: "seller-1".to_string(),
            title: "테스트 상품".to_string(),
            description: String::new(),
            image_url: String::new(),
            item_category: String::new(),
            seller_display_name: String::new(),
            starting_bid,
            current_bid,
            leading_bid_id: None,
            is_closed: false,
            end_at: Utc::now(),
            final_winning_amount: None,
            winner_uid: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_current_bid_without_bids() {
        assert_eq!(item(10.0, None).effective_current_bid(), 10.0);
    }

    #[test]
    fn test_effective_current_bid_with_bids() {
        assert_eq!(item(10.0, Some(15.0)).effective_current_bid(), 15.0);
    }
}
