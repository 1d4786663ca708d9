//! # Habitrail 웹 서버 진입점
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성
//! 4. 데이터베이스 마이그레이션 실행
//! 5. API 라우터 설정
//! 6. HTTP 서버 시작

mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;

use anyhow::Result;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use config::Config;
use routes::{AppState, *};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일이 없어도 에러 없이 넘어갑니다
    dotenvy::dotenv().ok();

    // RUST_LOG가 없으면 habitrail, tower_http, axum 모듈을 debug 레벨로
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habitrail=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting Habitrail server on {}:{}", config.host, config.port);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState {
        pool: pool.clone(),
        jwt_secret: config.jwt_secret.clone(),
        default_day_start: config.default_day_start,
    };

    // 인증 관련 라우트 (회원가입, 로그인, 토큰 갱신, 로그아웃, 내 정보)
    let auth_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me));

    let api_routes = Router::new()
        .merge(auth_routes)
        // 프로필 & 친구
        .route("/users/profile", put(update_profile))
        .route("/users/profile/{user_id}", get(get_profile))
        .route("/users/friends/{user_id}", get(list_friends).delete(remove_friend))
        .route("/users/friend-requests", get(list_friend_requests).post(send_friend_request))
        .route("/users/friend-requests/{request_id}", delete(reject_friend_request))
        .route("/users/friend-requests/{request_id}/accept", put(accept_friend_request))
        // 습관 & 트래킹 (정적 경로 `trackings`가 `{habit_id}`보다 우선)
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/trackings", post(create_tracking))
        .route("/habits/trackings/{tracking_id}", put(update_tracking).delete(delete_tracking))
        .route("/habits/{habit_id}", get(get_habit).put(update_habit).delete(delete_habit))
        // 그룹
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/{group_id}", get(get_group).put(update_group).delete(delete_group))
        .route("/groups/{group_id}/members", post(add_group_member))
        .route("/groups/{group_id}/members/{member_id}", delete(remove_group_member))
        .route("/groups/{group_id}/members/{member_id}/admin", put(promote_group_member))
        .route("/groups/{group_id}/leave", post(leave_group))
        .route(
            "/groups/{group_id}/habit/participation",
            post(join_group_habit).delete(leave_group_habit),
        )
        // 대화방
        .route("/conversations", get(list_conversations))
        .route("/conversations/direct/{user_id}", post(create_direct_conversation))
        .route("/conversations/{conversation_id}", get(get_conversation))
        .route("/conversations/{conversation_id}/messages", post(send_message))
        .route(
            "/conversations/{conversation_id}/messages/{message_id}",
            delete(delete_message),
        )
        .route("/health", get(health_check))
        .with_state(state);

    // 개발 환경 기준: 모든 출처 허용
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
