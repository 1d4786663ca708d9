//! # 습관(Habit) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/habits`                         → 내 습관 목록 (스트릭 포함)
//! - `POST   /api/v1/habits`                         → 습관 생성
//! - `GET    /api/v1/habits/{habit_id}`              → 습관 상세 (트래킹, 스트릭, 그룹 참여)
//! - `PUT    /api/v1/habits/{habit_id}`              → 습관 수정 → 스트릭 재계산
//! - `DELETE /api/v1/habits/{habit_id}`              → 습관 삭제
//! - `POST   /api/v1/habits/trackings`               → 트래킹 기록 → 스트릭 재계산
//! - `PUT    /api/v1/habits/trackings/{tracking_id}` → 트래킹 수정 → 스트릭 재계산
//! - `DELETE /api/v1/habits/trackings/{tracking_id}` → 트래킹 삭제 → 스트릭 재계산
//!
//! 다른 사용자의 습관이나 트래킹 기록은 존재하지 않는 것과 똑같이 404로 응답합니다.
//!
//! ## 스트릭 재계산
//! 변경이 DB에 반영된 뒤 같은 요청 안에서 `recalc::refresh_habit_streak_best_effort()`를
//! 기다립니다. 재계산이 실패해도 변경은 취소되지 않으며, 응답의 `streak`이 `null`이 됩니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
    services::{
        period::{format_timestamp, parse_timestamp},
        recalc,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

pub(crate) fn validate_frequency_count(value: i64) -> Result<(), AppError> {
    if value < 1 || value > i64::from(u32::MAX) {
        return Err(AppError::BadRequest("frequency_count must be a positive 32-bit integer".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_goal_streak(value: Option<i64>) -> Result<(), AppError> {
    if value.is_some_and(|goal| goal < 1) {
        return Err(AppError::BadRequest("goal_streak must be at least 1".to_string()));
    }
    Ok(())
}

/// 요청의 RFC 3339 시각을 저장 형식(UTC, 밀리초)으로 정규화합니다.
fn normalize_date(value: &str) -> Result<String, AppError> {
    let timestamp = parse_timestamp(value)
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}': expected RFC 3339", value)))?;
    Ok(format_timestamp(timestamp))
}

async fn owned_habit(state: &AppState, habit_id: &str, user_id: &str) -> Result<Habit, AppError> {
    db::habits::get_user_habit(&state.pool, habit_id, user_id)
        .await?
        .ok_or(AppError::NotFound)
}

async fn owned_tracking(
    state: &AppState,
    tracking_id: &str,
    user_id: &str,
) -> Result<HabitTracking, AppError> {
    db::trackings::get_tracking(&state.pool, tracking_id)
        .await?
        .filter(|tracking| tracking.user_id == user_id)
        .ok_or(AppError::NotFound)
}

pub async fn list_habits(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let habits = db::habits::list_habits(&state.pool, &auth_user.user_id).await?;

    let mut items = Vec::with_capacity(habits.len());
    for habit in habits {
        let streak = db::streaks::get_streak(&state.pool, &habit.id, &auth_user.user_id).await?;
        items.push(HabitWithStreak { habit, streak });
    }

    Ok(Json(json!({ "habits": items })))
}

pub async fn create_habit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    validate_frequency_count(req.frequency_count)?;
    validate_goal_streak(req.goal_streak)?;

    let habit = db::habits::create_habit(&state.pool, &auth_user.user_id, &req).await?;
    tracing::debug!(habit_id = %habit.id, period = %habit.frequency_period, "habit created");

    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn get_habit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(habit_id): Path<String>,
) -> Result<Json<HabitDetail>, AppError> {
    let habit = owned_habit(&state, &habit_id, &auth_user.user_id).await?;

    let trackings = db::trackings::list_trackings(&state.pool, &habit.id, &auth_user.user_id).await?;
    let streak = db::streaks::get_streak(&state.pool, &habit.id, &auth_user.user_id).await?;
    let participations = db::groups::list_participations_for_habit(&state.pool, &habit.id).await?;

    Ok(Json(HabitDetail {
        habit,
        trackings,
        streak,
        participations,
    }))
}

/// 주기나 횟수가 바뀌면 스트릭 의미가 달라지므로 수정 후 항상 재계산합니다.
pub async fn update_habit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(habit_id): Path<String>,
    Json(req): Json<UpdateHabitRequest>,
) -> Result<Json<HabitWithStreak>, AppError> {
    owned_habit(&state, &habit_id, &auth_user.user_id).await?;

    if req.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        return Err(AppError::BadRequest("Title must not be empty".to_string()));
    }
    if let Some(frequency_count) = req.frequency_count {
        validate_frequency_count(frequency_count)?;
    }
    validate_goal_streak(req.goal_streak)?;

    let habit = db::habits::update_habit(&state.pool, &habit_id, &req)
        .await?
        .ok_or(AppError::NotFound)?;

    // 재계산에 실패하면 이전 설정으로 계산된 행 대신 `null`을 돌려줍니다
    let streak = match recalc::refresh_habit_streak_best_effort(&state.pool, &habit, Utc::now()).await {
        Some(_) => db::streaks::get_streak(&state.pool, &habit.id, &auth_user.user_id).await?,
        None => None,
    };

    Ok(Json(HabitWithStreak { habit, streak }))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(habit_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db::habits::delete_habit(&state.pool, &habit_id, &auth_user.user_id).await? {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_tracking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateTrackingRequest>,
) -> Result<(StatusCode, Json<TrackingResponse>), AppError> {
    let habit = owned_habit(&state, &req.habit_id, &auth_user.user_id).await?;
    let date = normalize_date(&req.date)?;

    let tracking = db::trackings::create_tracking(
        &state.pool,
        &habit.id,
        &auth_user.user_id,
        &date,
        req.notes.as_deref(),
    )
    .await?;

    let streak = recalc::refresh_habit_streak_best_effort(&state.pool, &habit, Utc::now()).await;

    Ok((StatusCode::CREATED, Json(TrackingResponse { tracking, streak })))
}

pub async fn update_tracking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(tracking_id): Path<String>,
    Json(req): Json<UpdateTrackingRequest>,
) -> Result<Json<TrackingResponse>, AppError> {
    let existing = owned_tracking(&state, &tracking_id, &auth_user.user_id).await?;
    let habit = owned_habit(&state, &existing.habit_id, &auth_user.user_id).await?;
    let date = req.date.as_deref().map(normalize_date).transpose()?;

    let tracking = db::trackings::update_tracking(
        &state.pool,
        &existing.id,
        date.as_deref(),
        req.notes.as_deref(),
    )
    .await?
    .ok_or(AppError::NotFound)?;

    let streak = recalc::refresh_habit_streak_best_effort(&state.pool, &habit, Utc::now()).await;

    Ok(Json(TrackingResponse { tracking, streak }))
}

pub async fn delete_tracking(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(tracking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let existing = owned_tracking(&state, &tracking_id, &auth_user.user_id).await?;
    let habit = owned_habit(&state, &existing.habit_id, &auth_user.user_id).await?;

    db::trackings::delete_tracking(&state.pool, &existing.id).await?;

    let streak = recalc::refresh_habit_streak_best_effort(&state.pool, &habit, Utc::now()).await;

    Ok(Json(json!({
        "message": "Tracking deleted",
        "streak": streak
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::period::DayStart;

    #[test]
    fn test_normalize_date_converts_offsets_to_utc() {
        assert_eq!(
            normalize_date("2025-02-06T08:30:00+09:00").unwrap(),
            "2025-02-05T23:30:00.000Z"
        );
        assert!(matches!(
            normalize_date("2025-02-06"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_frequency_validation() {
        assert!(validate_frequency_count(0).is_err());
        assert!(validate_frequency_count(1).is_ok());
        assert!(validate_frequency_count(i64::from(u32::MAX) + 1).is_err());
        assert!(validate_goal_streak(Some(0)).is_err());
        assert!(validate_goal_streak(None).is_ok());
    }

    #[tokio::test]
    async fn test_update_habit_returns_null_streak_when_recalculation_fails() {
        let pool = db::test_pool().await;
        db::seed_user(&pool, "alice", "05:00").await;
        let habit = db::habits::create_habit(
            &pool,
            "alice",
            &CreateHabitRequest {
                title: "Read".to_string(),
                description: None,
                frequency_count: 1,
                frequency_period: FrequencyPeriod::Day,
                goal_streak: None,
            },
        )
        .await
        .unwrap();
        let date = normalize_date("2025-02-06T09:00:00Z").unwrap();
        db::trackings::create_tracking(&pool, &habit.id, "alice", &date, None)
            .await
            .unwrap();
        assert!(recalc::refresh_habit_streak_best_effort(&pool, &habit, Utc::now()).await.is_some());

        sqlx::query("UPDATE users SET day_start = '7:00' WHERE id = 'alice'")
            .execute(&pool)
            .await
            .unwrap();

        let state = AppState {
            pool: pool.clone(),
            jwt_secret: "test-secret".to_string(),
            default_day_start: DayStart::MIDNIGHT,
        };
        let Json(body) = update_habit(
            State(state),
            AuthUser { user_id: "alice".to_string() },
            Path(habit.id.clone()),
            Json(UpdateHabitRequest {
                title: None,
                description: None,
                frequency_count: Some(2),
                frequency_period: None,
                goal_streak: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(body.habit.frequency_count, 2);
        assert!(body.streak.is_none());
        // 이전 설정의 행은 남아 있지만 응답에는 실리지 않습니다
        assert!(db::streaks::get_streak(&pool, &habit.id, "alice").await.unwrap().is_some());
    }
}
