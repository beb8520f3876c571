// region:    --- Imports
use crate::database::DatabaseManager;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod bidding;
mod database;
mod error;
mod handlers;
mod notification;
mod query;
mod settlement;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 알림 디스패처 시작 (커밋 이후 fire-and-forget 발송)
    let mailer = notification::mailer_from_env();
    let (notifier, dispatcher) = notification::channel(db_manager.get_pool(), mailer);
    tokio::spawn(async move {
        dispatcher.start().await;
    });

    // 열린 CORS 설정 (OPTIONS 프리플라이트 포함)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/api/place-bid", post(handlers::handle_place_bid))
        .route("/api/cancel-auction", post(handlers::handle_cancel_auction))
        .route("/api/end-auction", post(handlers::handle_end_auction))
        .route(
            "/api/user/active-bids",
            get(handlers::handle_get_active_bid_count),
        )
        .route("/api/user/bids", get(handlers::handle_get_user_bids))
        .route("/api/items", get(handlers::handle_get_items))
        .route("/api/items/:id", get(handlers::handle_get_item))
        .route("/api/items/:id/bids", get(handlers::handle_get_item_bids))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 2))
        .with_state((db_manager, notifier));

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
