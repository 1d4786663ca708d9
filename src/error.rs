//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 에러 타입을 정의합니다.
//!
//! - `AppError`: HTTP 계층까지 전파되는 모든 에러를 하나의 타입으로 통합
//! - `StreakError`: 스트릭 엔진(기간 키 계산, 날짜 파싱)에서 발생하는 에러
//! - `IntoResponse` 구현: 에러를 `{ "error": { "code", "message" } }` JSON 응답으로 변환

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 스트릭 계산 중 발생하는 에러
///
/// 입력값 검증은 요청 단계에서 끝나므로, 이 에러가 발생한다면
/// 대부분 DB에 저장된 값이 손상된 경우입니다.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreakError {
    /// `day_start`가 24시간제 "HH:MM" 형식이 아님
    #[error("Invalid day start '{0}': expected HH:MM (24h)")]
    InvalidDayStart(String),

    /// 기간 키를 날짜로 되돌릴 수 없음 (예: "2025-13-01")
    #[error("Invalid period key '{0}'")]
    InvalidPeriodKey(String),

    /// 저장된 트래킹 타임스탬프가 RFC 3339 형식이 아님
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 요청 (HTTP 400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from]: sqlx 함수의 에러에 `?`를 쓰면 자동으로 이 variant로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 스트릭 계산 오류 (HTTP 500)
    #[error("Streak error: {0}")]
    Streak(#[from] StreakError),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 권한 없음 (HTTP 403) — 인증은 되었지만 해당 작업을 할 수 없는 경우
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 리소스 충돌 (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    /// 내부 에러(Database, Streak, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Streak(ref e) => {
                tracing::error!("Streak error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "streak_error",
                    "Streak computation failed".to_string(),
                )
            }
            AppError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::Conflict(ref msg) => {
                (StatusCode::CONFLICT, "conflict", msg.clone())
            }
        };

        // 결과: { "error": { "code": "not_found", "message": "Resource not found" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
