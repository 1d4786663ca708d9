//! # 습관(Habit) 데이터베이스 쿼리 모듈
//!
//! 습관 행의 생성, 조회, 수정, 삭제를 담당합니다.
//! 습관을 삭제하면 외래 키의 `ON DELETE CASCADE`로 트래킹 기록, 스트릭 행,
//! 그룹 참여 기록까지 함께 삭제됩니다.

use crate::error::AppError;
use crate::models::{CreateHabitRequest, Habit, UpdateHabitRequest};
use sqlx::SqlitePool;

/// 새 습관을 만듭니다.
pub async fn create_habit(
    pool: &SqlitePool,
    user_id: &str,
    req: &CreateHabitRequest,
) -> Result<Habit, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO habits (id, user_id, title, description, frequency_count, frequency_period, goal_streak)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.frequency_count)
    .bind(req.frequency_period)
    .bind(req.goal_streak)
    .execute(pool)
    .await?;

    get_habit(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created habit".to_string()))
}

/// ID로 습관 하나를 조회합니다. 소유자는 확인하지 않습니다.
pub async fn get_habit(pool: &SqlitePool, id: &str) -> Result<Option<Habit>, AppError> {
    let habit = sqlx::query_as::<_, Habit>(
        r#"
        SELECT id, user_id, title, description, frequency_count, frequency_period,
               goal_streak, created_at, updated_at
        FROM habits
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(habit)
}

/// `user_id`가 소유한 습관만 조회합니다.
///
/// 다른 사람의 습관이면 `None`을 반환하므로, 라우트에서는 존재하지 않는 습관과
/// 똑같이 404로 처리합니다.
pub async fn get_user_habit(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<Habit>, AppError> {
    Ok(get_habit(pool, id)
        .await?
        .filter(|habit| habit.user_id == user_id))
}

/// 사용자의 모든 습관을 최근 수정순으로 조회합니다.
pub async fn list_habits(pool: &SqlitePool, user_id: &str) -> Result<Vec<Habit>, AppError> {
    let habits = sqlx::query_as::<_, Habit>(
        r#"
        SELECT id, user_id, title, description, frequency_count, frequency_period,
               goal_streak, created_at, updated_at
        FROM habits
        WHERE user_id = ?
        ORDER BY updated_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(habits)
}

/// 습관을 부분 수정합니다. 요청에 없는 필드는 기존 값을 유지합니다.
///
/// `goal_streak`은 `None`이면 기존 값을 유지하므로, 목표를 지우는 기능은 없습니다.
pub async fn update_habit(
    pool: &SqlitePool,
    id: &str,
    req: &UpdateHabitRequest,
) -> Result<Option<Habit>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE habits
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            frequency_count = COALESCE(?, frequency_count),
            frequency_period = COALESCE(?, frequency_period),
            goal_streak = COALESCE(?, goal_streak),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(&req.description)
    .bind(req.frequency_count)
    .bind(req.frequency_period)
    .bind(req.goal_streak)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_habit(pool, id).await
}

/// 습관을 삭제합니다. 삭제된 행이 있으면 `true`.
pub async fn delete_habit(pool: &SqlitePool, id: &str, user_id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM habits WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed_user, test_pool};
    use crate::models::FrequencyPeriod;

    fn daily(title: &str) -> CreateHabitRequest {
        CreateHabitRequest {
            title: title.to_string(),
            description: None,
            frequency_count: 1,
            frequency_period: FrequencyPeriod::Day,
            goal_streak: Some(30),
        }
    }

    #[tokio::test]
    async fn test_habit_is_scoped_to_owner() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "00:00").await;
        seed_user(&pool, "bob", "00:00").await;

        let habit = create_habit(&pool, "alice", &daily("Read")).await.unwrap();

        assert!(get_user_habit(&pool, &habit.id, "alice").await.unwrap().is_some());
        assert!(get_user_habit(&pool, &habit.id, "bob").await.unwrap().is_none());
        assert!(!delete_habit(&pool, &habit.id, "bob").await.unwrap());
        assert!(delete_habit(&pool, &habit.id, "alice").await.unwrap());
        assert!(get_habit(&pool, &habit.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "00:00").await;
        let habit = create_habit(&pool, "alice", &daily("Read")).await.unwrap();

        let update = UpdateHabitRequest {
            title: None,
            description: Some("20 pages".to_string()),
            frequency_count: Some(3),
            frequency_period: Some(FrequencyPeriod::Week),
            goal_streak: None,
        };
        let updated = update_habit(&pool, &habit.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.title, "Read");
        assert_eq!(updated.description.as_deref(), Some("20 pages"));
        assert_eq!(updated.frequency_count, 3);
        assert_eq!(updated.frequency_period, FrequencyPeriod::Week);
        assert_eq!(updated.goal_streak, Some(30));

        assert!(update_habit(&pool, "missing", &update).await.unwrap().is_none());
    }
}
