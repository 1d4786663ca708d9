use crate::error::AppError;
use crate::models::Streak;
use crate::services::streak::StreakSummary;
use sqlx::SqlitePool;

/// (습관, 사용자) 스트릭 행을 새로 계산한 값으로 덮어씁니다.
pub async fn upsert_streak(
    pool: &SqlitePool,
    habit_id: &str,
    user_id: &str,
    summary: StreakSummary,
    last_updated: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO streaks (habit_id, user_id, current_streak, max_streak, last_updated)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(habit_id, user_id) DO UPDATE SET
            current_streak = excluded.current_streak,
            max_streak = excluded.max_streak,
            last_updated = excluded.last_updated
        "#,
    )
    .bind(habit_id)
    .bind(user_id)
    .bind(summary.current_streak)
    .bind(summary.max_streak)
    .bind(last_updated)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_streak(
    pool: &SqlitePool,
    habit_id: &str,
    user_id: &str,
) -> Result<Option<Streak>, AppError> {
    let streak = sqlx::query_as::<_, Streak>(
        r#"
        SELECT habit_id, user_id, current_streak, max_streak, last_updated
        FROM streaks
        WHERE habit_id = ? AND user_id = ?
        "#,
    )
    .bind(habit_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(streak)
}
