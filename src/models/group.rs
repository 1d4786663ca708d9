//! # 그룹(Group) 모델 정의
//!
//! 그룹, 멤버십, 그룹 공동 습관(GroupHabit)과 참여(Participation) 구조체들입니다.
//!
//! ## 관계
//! ```text
//! habit_groups (1) ── memberships (N) ── users
//!      │
//!      └── group_habits (1) ── habit_participations (N) ── habits (각 멤버의 개인 습관)
//! ```
//! 멤버는 자신의 개인 습관 하나를 그룹 습관에 연결해야 그룹 스트릭 계산에 포함됩니다.

use serde::{Deserialize, Serialize};

use crate::models::FrequencyPeriod;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: String,
    pub creator_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// 그룹 내 역할 — 관리자(ADMIN)만 그룹 수정/삭제/멤버 관리를 할 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub group_id: String,
    pub user_id: String,
    pub role: Role,
    pub joined_at: String,
}

/// 그룹 공동 습관
///
/// 그룹 스트릭은 멤버 개인 습관의 설정이 아니라
/// 이 구조체의 `frequency_count` / `frequency_period` / `day_start`로 계산합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GroupHabit {
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub frequency_count: i64,
    pub frequency_period: FrequencyPeriod,
    pub goal_streak: Option<i64>,
    pub day_start: String,
    pub created_at: String,
}

/// 멤버 한 명이 자신의 습관(`habit_id`)을 그룹 습관에 연결한 기록
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participation {
    pub id: String,
    pub group_habit_id: String,
    pub user_id: String,
    pub habit_id: String,
    pub joined_at: String,
}

/// `GET /api/v1/groups/{group_id}` 응답
///
/// `group_streak`은 요청 시점에 모든 참여자의 트래킹 기록으로 새로 계산한 값입니다.
#[derive(Debug, Serialize)]
pub struct GroupDetail {
    pub group: Group,
    pub memberships: Vec<Membership>,
    pub group_habit: Option<GroupHabit>,
    pub participations: Vec<Participation>,
    pub conversation_id: Option<String>,
    pub group_streak: u32,
}

/// 그룹 생성 요청 — 그룹과 그룹 습관을 한 번에 만듭니다.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    /// 초기 멤버 ID 목록 (생성자는 자동으로 ADMIN 멤버가 됨)
    pub member_ids: Option<Vec<String>>,
    pub habit_title: String,
    pub frequency_count: i64,
    pub frequency_period: FrequencyPeriod,
    pub goal_streak: Option<i64>,
    /// 그룹 습관의 하루 시작 시각 ("HH:MM"), 없으면 서버 기본값 (`DEFAULT_DAY_START`)
    pub day_start: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub member_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinGroupHabitRequest {
    pub habit_id: String,
}
