pub mod bidding;
pub mod database;
pub mod error;
pub mod handlers;
pub mod notification;
pub mod query;
pub mod settlement;
