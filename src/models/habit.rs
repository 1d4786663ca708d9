//! # 습관(Habit) 모델 정의
//!
//! 습관, 습관 트래킹 기록, 스트릭 행과 관련 요청/응답 구조체들을 정의합니다.
//!
//! ## 구조체 역할
//! - `FrequencyPeriod`: 목표 주기 (day / week / month)
//! - `Habit`: DB의 `habits` 테이블 한 행
//! - `HabitTracking`: 습관을 수행했다는 기록 한 건 (`habit_trackings`)
//! - `Streak`: (habit, user) 쌍의 현재/최대 스트릭 (`streaks`)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Participation;
use crate::services::streak::StreakSummary;

/// 습관의 목표 주기
///
/// DB와 JSON 모두에서 소문자 문자열(`"day"`, `"week"`, `"month"`)로 표현됩니다.
/// 닫힌 enum이므로 알 수 없는 주기 값은 요청 파싱 단계에서 거부됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FrequencyPeriod {
    Day,
    Week,
    Month,
}

impl FrequencyPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for FrequencyPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 습관 엔티티
///
/// `frequency_count`는 한 기간(`frequency_period`) 안에 필요한 최소 트래킹 횟수입니다.
/// 예: `frequency_count = 3`, `frequency_period = week` → "일주일에 3번"
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Habit {
    pub id: String,
    /// 습관 소유자 ID
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub frequency_count: i64,
    pub frequency_period: FrequencyPeriod,
    /// 사용자가 목표로 하는 스트릭 길이 (선택)
    pub goal_streak: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// 습관 트래킹 기록: "이 시각에 습관을 수행했다"는 사실 한 건
///
/// `date`는 ISO 8601 UTC 문자열 (예: "2025-02-06T06:00:00.000Z")입니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HabitTracking {
    pub id: String,
    pub habit_id: String,
    pub user_id: String,
    pub date: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// 스트릭 행. 재계산 때마다 통째로 덮어씁니다 (upsert).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Streak {
    pub habit_id: String,
    pub user_id: String,
    pub current_streak: i64,
    pub max_streak: i64,
    pub last_updated: String,
}

/// `GET /api/v1/habits` 목록의 항목: 습관 + 스트릭
#[derive(Debug, Serialize)]
pub struct HabitWithStreak {
    #[serde(flatten)]
    pub habit: Habit,
    pub streak: Option<Streak>,
}

/// `GET /api/v1/habits/{habit_id}` 응답: 트래킹 기록과 그룹 참여 정보까지 포함
#[derive(Debug, Serialize)]
pub struct HabitDetail {
    #[serde(flatten)]
    pub habit: Habit,
    pub trackings: Vec<HabitTracking>,
    pub streak: Option<Streak>,
    pub participations: Vec<Participation>,
}

/// 습관 생성 요청 — `POST /api/v1/habits`
#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub title: String,
    pub description: Option<String>,
    pub frequency_count: i64,
    pub frequency_period: FrequencyPeriod,
    pub goal_streak: Option<i64>,
}

/// 습관 수정 요청 — `PUT /api/v1/habits/{habit_id}` (부분 업데이트)
#[derive(Debug, Deserialize)]
pub struct UpdateHabitRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency_count: Option<i64>,
    pub frequency_period: Option<FrequencyPeriod>,
    pub goal_streak: Option<i64>,
}

/// 트래킹 생성 요청 — `POST /api/v1/habits/trackings`
///
/// `date`는 RFC 3339 문자열이어야 합니다 (예: "2025-02-06T06:00:00Z").
#[derive(Debug, Deserialize)]
pub struct CreateTrackingRequest {
    pub habit_id: String,
    pub date: String,
    pub notes: Option<String>,
}

/// 트래킹 수정 요청 — `PUT /api/v1/habits/trackings/{tracking_id}`
#[derive(Debug, Deserialize)]
pub struct UpdateTrackingRequest {
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// 트래킹 변경 응답
///
/// `streak`은 변경 직후 재계산된 값입니다.
/// 재계산이 실패하면 `null`이 되며, 트래킹 변경 자체는 이미 반영된 상태입니다.
#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub tracking: HabitTracking,
    pub streak: Option<StreakSummary>,
}
