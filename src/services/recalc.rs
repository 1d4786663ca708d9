//! # 스트릭 재계산 서비스
//!
//! 트래킹 기록을 DB에서 읽어 `services::streak`의 순수 계산에 넘기고,
//! 개인 스트릭은 결과를 `streaks` 테이블에 덮어씁니다.
//!
//! ## 호출 시점
//! | 핸들러 | 함수 |
//! |--------|------|
//! | 트래킹 생성/수정/삭제, 습관 수정 | `refresh_habit_streak_best_effort()` |
//! | 프로필의 `day_start` 변경 | 소유한 모든 습관에 대해 `refresh_habit_streak_best_effort()` |
//! | 그룹 상세 조회 | `recalculate_group_streak()` |
//!
//! 재계산은 트래킹 변경이 커밋된 뒤 같은 요청 안에서 바로 실행됩니다.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    models::{FrequencyPeriod, Habit},
    services::{
        period::{format_timestamp, parse_timestamp, DayStart},
        streak::{compute_group_streak, compute_streak, StreakSummary},
    },
};

/// (habit, user)의 트래킹 기록 전체로 스트릭을 새로 계산하고 저장합니다.
pub async fn recalculate_individual_streak(
    pool: &SqlitePool,
    habit_id: &str,
    user_id: &str,
    frequency_count: u32,
    period: FrequencyPeriod,
    day_start: DayStart,
    now: DateTime<Utc>,
) -> Result<StreakSummary, AppError> {
    let timestamps = load_timestamps(pool, habit_id, user_id).await?;
    let summary = compute_streak(&timestamps, frequency_count, period, day_start, now)?;

    db::streaks::upsert_streak(pool, habit_id, user_id, summary, &format_timestamp(now)).await?;

    tracing::debug!(
        habit_id,
        user_id,
        current = summary.current_streak,
        max = summary.max_streak,
        "streak recalculated"
    );

    Ok(summary)
}

/// 습관 소유자의 `day_start`와 습관 설정으로 스트릭을 재계산합니다.
pub async fn refresh_habit_streak(
    pool: &SqlitePool,
    habit: &Habit,
    now: DateTime<Utc>,
) -> Result<StreakSummary, AppError> {
    let owner = db::users::find_by_id(pool, &habit.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let day_start: DayStart = owner.day_start.parse()?;

    recalculate_individual_streak(
        pool,
        &habit.id,
        &habit.user_id,
        frequency_count(habit.frequency_count)?,
        habit.frequency_period,
        day_start,
        now,
    )
    .await
}

/// `refresh_habit_streak()`을 실행하되 실패해도 호출자에게 에러를 돌려주지 않습니다.
///
/// 트래킹 변경은 이미 커밋되었으므로, 실패는 경고 로그로 남기고 `None`을 반환합니다.
pub async fn refresh_habit_streak_best_effort(
    pool: &SqlitePool,
    habit: &Habit,
    now: DateTime<Utc>,
) -> Option<StreakSummary> {
    match refresh_habit_streak(pool, habit, now).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::warn!(habit_id = %habit.id, error = %e, "streak recalculation failed");
            None
        }
    }
}

/// 그룹 습관의 현재 스트릭 (모든 참여자가 달성한 기간만 인정)
///
/// 그룹이나 그룹 습관이 없으면 `AppError::NotFound`.
pub async fn recalculate_group_streak(
    pool: &SqlitePool,
    group_id: &str,
    now: DateTime<Utc>,
) -> Result<u32, AppError> {
    db::groups::get_group(pool, group_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let group_habit = db::groups::get_group_habit(pool, group_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let day_start: DayStart = group_habit.day_start.parse()?;

    let participations = db::groups::list_participations(pool, &group_habit.id).await?;
    let mut members = Vec::with_capacity(participations.len());
    for participation in &participations {
        members.push(load_timestamps(pool, &participation.habit_id, &participation.user_id).await?);
    }

    let streak = compute_group_streak(
        &members,
        frequency_count(group_habit.frequency_count)?,
        group_habit.frequency_period,
        day_start,
        now,
    )?;

    tracing::debug!(group_id, participants = members.len(), streak, "group streak computed");

    Ok(streak)
}

async fn load_timestamps(
    pool: &SqlitePool,
    habit_id: &str,
    user_id: &str,
) -> Result<Vec<DateTime<Utc>>, AppError> {
    let dates = db::trackings::list_tracking_dates(pool, habit_id, user_id).await?;
    let timestamps = dates
        .iter()
        .map(|date| parse_timestamp(date))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(timestamps)
}

fn frequency_count(value: i64) -> Result<u32, AppError> {
    u32::try_from(value)
        .ok()
        .filter(|count| *count >= 1)
        .ok_or_else(|| AppError::Internal(format!("Invalid stored frequency_count {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{groups, habits, seed_user, test_pool, trackings};
    use crate::models::{CreateGroupRequest, CreateHabitRequest};

    fn ts(value: &str) -> DateTime<Utc> {
        parse_timestamp(value).unwrap()
    }

    async fn daily_habit(pool: &SqlitePool, user_id: &str, frequency_count: i64) -> Habit {
        habits::create_habit(
            pool,
            user_id,
            &CreateHabitRequest {
                title: "Stretch".to_string(),
                description: None,
                frequency_count,
                frequency_period: FrequencyPeriod::Day,
                goal_streak: None,
            },
        )
        .await
        .unwrap()
    }

    async fn track(pool: &SqlitePool, habit: &Habit, date: &str) {
        trackings::create_tracking(pool, &habit.id, &habit.user_id, &format_timestamp(ts(date)), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_recalculation_persists_streak_row() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "05:00").await;
        let habit = daily_habit(&pool, "alice", 1).await;
        track(&pool, &habit, "2025-02-05T09:00:00Z").await;
        track(&pool, &habit, "2025-02-06T08:00:00Z").await;

        let now = ts("2025-02-06T12:00:00Z");
        let summary = refresh_habit_streak(&pool, &habit, now).await.unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 2, max_streak: 2 });

        let row = db::streaks::get_streak(&pool, &habit.id, "alice").await.unwrap().unwrap();
        assert_eq!(row.current_streak, 2);
        assert_eq!(row.max_streak, 2);
        assert_eq!(row.last_updated, format_timestamp(now));

        // 이틀 뒤에는 현재 스트릭이 끊기고, 행은 새 값으로 덮어써집니다
        let later = ts("2025-02-08T12:00:00Z");
        refresh_habit_streak(&pool, &habit, later).await.unwrap();
        let row = db::streaks::get_streak(&pool, &habit.id, "alice").await.unwrap().unwrap();
        assert_eq!(row.current_streak, 0);
        assert_eq!(row.max_streak, 2);
        assert_eq!(row.last_updated, format_timestamp(later));
    }

    #[tokio::test]
    async fn test_owner_day_start_is_applied() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "05:00").await;
        let habit = daily_habit(&pool, "alice", 2).await;
        track(&pool, &habit, "2025-02-06T09:00:00Z").await;
        track(&pool, &habit, "2025-02-07T03:00:00Z").await;

        let now = ts("2025-02-07T04:00:00Z");
        let summary = refresh_habit_streak(&pool, &habit, now).await.unwrap();
        assert_eq!(summary.current_streak, 1);

        db::users::update_profile(&pool, "alice", None, None, None, None, Some("00:00"))
            .await
            .unwrap();
        let summary = refresh_habit_streak(&pool, &habit, now).await.unwrap();
        assert_eq!(summary, StreakSummary::default());
    }

    #[tokio::test]
    async fn test_best_effort_returns_none_on_corrupt_day_start() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "25:00").await;
        let habit = daily_habit(&pool, "alice", 1).await;

        let result = refresh_habit_streak(&pool, &habit, ts("2025-02-06T12:00:00Z")).await;
        assert!(matches!(result, Err(AppError::Streak(_))));
        assert!(
            refresh_habit_streak_best_effort(&pool, &habit, ts("2025-02-06T12:00:00Z"))
                .await
                .is_none()
        );
        assert!(db::streaks::get_streak(&pool, &habit.id, "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_recalculation_keeps_tracking() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "7:00").await;
        let habit = daily_habit(&pool, "alice", 1).await;
        let tracking = trackings::create_tracking(
            &pool,
            &habit.id,
            "alice",
            &format_timestamp(ts("2025-02-06T09:00:00Z")),
            None,
        )
        .await
        .unwrap();

        let summary =
            refresh_habit_streak_best_effort(&pool, &habit, ts("2025-02-06T12:00:00Z")).await;
        assert!(summary.is_none());

        let stored = trackings::get_tracking(&pool, &tracking.id).await.unwrap();
        assert_eq!(stored.map(|t| t.id), Some(tracking.id));
        assert!(db::streaks::get_streak(&pool, &habit.id, "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_group_streak_needs_every_participant() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "00:00").await;
        seed_user(&pool, "bob", "00:00").await;

        let request = CreateGroupRequest {
            name: "Stretchers".to_string(),
            description: None,
            member_ids: Some(vec!["bob".to_string()]),
            habit_title: "Stretch".to_string(),
            frequency_count: 1,
            frequency_period: FrequencyPeriod::Day,
            goal_streak: None,
            day_start: None,
        };
        let group = groups::create_group(&pool, "alice", &request, "05:00").await.unwrap();
        let group_habit = groups::get_group_habit(&pool, &group.id).await.unwrap().unwrap();
        let now = ts("2025-02-06T12:00:00Z");

        // 참여자가 없으면 0
        assert_eq!(recalculate_group_streak(&pool, &group.id, now).await.unwrap(), 0);

        let alice_habit = daily_habit(&pool, "alice", 1).await;
        let bob_habit = daily_habit(&pool, "bob", 1).await;
        groups::create_participation(&pool, &group_habit.id, "alice", &alice_habit.id)
            .await
            .unwrap();
        groups::create_participation(&pool, &group_habit.id, "bob", &bob_habit.id)
            .await
            .unwrap();

        track(&pool, &alice_habit, "2025-02-05T09:00:00Z").await;
        track(&pool, &alice_habit, "2025-02-06T09:00:00Z").await;
        track(&pool, &bob_habit, "2025-02-06T10:00:00Z").await;
        assert_eq!(recalculate_group_streak(&pool, &group.id, now).await.unwrap(), 1);

        track(&pool, &bob_habit, "2025-02-05T10:00:00Z").await;
        assert_eq!(recalculate_group_streak(&pool, &group.id, now).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_group_streak_missing_group() {
        let pool = test_pool().await;
        let result = recalculate_group_streak(&pool, "missing", ts("2025-02-06T12:00:00Z")).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
