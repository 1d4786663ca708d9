//! # 트래킹 기록 데이터베이스 쿼리 모듈
//!
//! `habit_trackings` 테이블을 다룹니다. 트래킹 한 건은 "이 시각에 습관을 수행했다"는
//! 기록이며, 스트릭 재계산의 유일한 입력입니다.
//!
//! `date` 컬럼은 항상 `TIMESTAMP_FORMAT`으로 정규화된 UTC 문자열로 저장합니다.

use crate::error::AppError;
use crate::models::HabitTracking;
use sqlx::SqlitePool;

pub async fn create_tracking(
    pool: &SqlitePool,
    habit_id: &str,
    user_id: &str,
    date: &str,
    notes: Option<&str>,
) -> Result<HabitTracking, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO habit_trackings (id, habit_id, user_id, date, notes)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(habit_id)
    .bind(user_id)
    .bind(date)
    .bind(notes)
    .execute(pool)
    .await?;

    get_tracking(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created tracking".to_string()))
}

pub async fn get_tracking(pool: &SqlitePool, id: &str) -> Result<Option<HabitTracking>, AppError> {
    let tracking = sqlx::query_as::<_, HabitTracking>(
        r#"
        SELECT id, habit_id, user_id, date, notes, created_at
        FROM habit_trackings
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(tracking)
}

pub async fn update_tracking(
    pool: &SqlitePool,
    id: &str,
    date: Option<&str>,
    notes: Option<&str>,
) -> Result<Option<HabitTracking>, AppError> {
    sqlx::query(
        r#"
        UPDATE habit_trackings
        SET date = COALESCE(?, date),
            notes = COALESCE(?, notes)
        WHERE id = ?
        "#,
    )
    .bind(date)
    .bind(notes)
    .bind(id)
    .execute(pool)
    .await?;

    get_tracking(pool, id).await
}

pub async fn delete_tracking(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM habit_trackings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 한 사용자의 한 습관에 대한 트래킹 기록 전체 (최신순)
pub async fn list_trackings(
    pool: &SqlitePool,
    habit_id: &str,
    user_id: &str,
) -> Result<Vec<HabitTracking>, AppError> {
    let trackings = sqlx::query_as::<_, HabitTracking>(
        r#"
        SELECT id, habit_id, user_id, date, notes, created_at
        FROM habit_trackings
        WHERE habit_id = ? AND user_id = ?
        ORDER BY date DESC
        "#,
    )
    .bind(habit_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(trackings)
}

/// 스트릭 계산용: 타임스탬프 문자열만 가져옵니다.
pub async fn list_tracking_dates(
    pool: &SqlitePool,
    habit_id: &str,
    user_id: &str,
) -> Result<Vec<String>, AppError> {
    let dates = sqlx::query_scalar::<_, String>(
        "SELECT date FROM habit_trackings WHERE habit_id = ? AND user_id = ?",
    )
    .bind(habit_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(dates)
}
