//! # 그룹 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/groups`                                   → 내가 속한 그룹 목록
//! - `POST   /api/v1/groups`                                   → 그룹 + 그룹 습관 + 그룹 대화방 생성
//! - `GET    /api/v1/groups/{group_id}`                        → 그룹 상세 + 그룹 스트릭 (멤버만)
//! - `PUT    /api/v1/groups/{group_id}`                        → 이름/설명 수정 (ADMIN)
//! - `DELETE /api/v1/groups/{group_id}`                        → 그룹 삭제 (ADMIN)
//! - `POST   /api/v1/groups/{group_id}/members`                → 멤버 추가 (ADMIN)
//! - `DELETE /api/v1/groups/{group_id}/members/{member_id}`    → 멤버 내보내기 (ADMIN)
//! - `PUT    /api/v1/groups/{group_id}/members/{member_id}/admin` → ADMIN 지정 (ADMIN)
//! - `POST   /api/v1/groups/{group_id}/leave`                  → 그룹 나가기
//! - `POST   /api/v1/groups/{group_id}/habit/participation`    → 내 습관을 그룹 습관에 연결
//! - `DELETE /api/v1/groups/{group_id}/habit/participation`    → 연결 해제
//!
//! 그룹이 없으면 404, 멤버가 아니거나 ADMIN 권한이 없으면 403입니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::{habits, AppState},
    services::{period::DayStart, recalc},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

async fn require_member(
    state: &AppState,
    group_id: &str,
    user_id: &str,
) -> Result<Membership, AppError> {
    db::groups::get_group(&state.pool, group_id)
        .await?
        .ok_or(AppError::NotFound)?;

    db::groups::get_membership(&state.pool, group_id, user_id)
        .await?
        .ok_or(AppError::Forbidden("Not a member of this group".to_string()))
}

async fn require_admin(
    state: &AppState,
    group_id: &str,
    user_id: &str,
) -> Result<Membership, AppError> {
    let membership = require_member(state, group_id, user_id).await?;
    if membership.role != Role::Admin {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }
    Ok(membership)
}

async fn load_group_habit(state: &AppState, group_id: &str) -> Result<GroupHabit, AppError> {
    db::groups::get_group_habit(&state.pool, group_id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn list_groups(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let groups = db::groups::list_groups_for_user(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "groups": groups })))
}

pub async fn create_group(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if req.habit_title.trim().is_empty() {
        return Err(AppError::BadRequest("habit_title is required".to_string()));
    }
    habits::validate_frequency_count(req.frequency_count)?;
    habits::validate_goal_streak(req.goal_streak)?;

    let day_start = match req.day_start.as_deref() {
        Some(value) => value
            .parse::<DayStart>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => state.default_day_start,
    };

    for member_id in req.member_ids.iter().flatten() {
        if db::users::find_by_id(&state.pool, member_id).await?.is_none() {
            return Err(AppError::BadRequest(format!("User {} does not exist", member_id)));
        }
    }

    let group =
        db::groups::create_group(&state.pool, &auth_user.user_id, &req, &day_start.to_string())
            .await?;
    tracing::info!(group_id = %group.id, creator = %auth_user.user_id, "group created");

    Ok((StatusCode::CREATED, Json(group)))
}

/// 그룹 스트릭은 저장하지 않고 조회할 때마다 모든 참여자의 기록으로 다시 계산합니다.
pub async fn get_group(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(group_id): Path<String>,
) -> Result<Json<GroupDetail>, AppError> {
    require_member(&state, &group_id, &auth_user.user_id).await?;

    let group = db::groups::get_group(&state.pool, &group_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let memberships = db::groups::list_memberships(&state.pool, &group_id).await?;
    let group_habit = db::groups::get_group_habit(&state.pool, &group_id).await?;
    let participations = match &group_habit {
        Some(habit) => db::groups::list_participations(&state.pool, &habit.id).await?,
        None => Vec::new(),
    };
    let conversation_id = db::groups::get_group_conversation_id(&state.pool, &group_id).await?;
    let group_streak = recalc::recalculate_group_streak(&state.pool, &group_id, Utc::now()).await?;

    Ok(Json(GroupDetail {
        group,
        memberships,
        group_habit,
        participations,
        conversation_id,
        group_streak,
    }))
}

pub async fn update_group(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(group_id): Path<String>,
    Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<Group>, AppError> {
    require_admin(&state, &group_id, &auth_user.user_id).await?;

    if req.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }

    let group = db::groups::update_group(
        &state.pool,
        &group_id,
        req.name.as_deref(),
        req.description.as_deref(),
    )
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(Json(group))
}

pub async fn delete_group(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(group_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_admin(&state, &group_id, &auth_user.user_id).await?;

    db::groups::delete_group(&state.pool, &group_id).await?;
    tracing::info!(group_id = %group_id, "group deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_group_member(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Membership>), AppError> {
    if req.member_id == auth_user.user_id {
        return Err(AppError::BadRequest("Cannot add yourself to the group".to_string()));
    }
    require_admin(&state, &group_id, &auth_user.user_id).await?;

    db::users::find_by_id(&state.pool, &req.member_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if db::groups::get_membership(&state.pool, &group_id, &req.member_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("User is already a member".to_string()));
    }

    let membership =
        db::groups::add_member(&state.pool, &group_id, &req.member_id, Role::User).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// ADMIN이 다른 멤버를 내보냅니다. 자기 자신은 `leave_group`을 써야 합니다.
pub async fn remove_group_member(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((group_id, member_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    if member_id == auth_user.user_id {
        return Err(AppError::BadRequest("Cannot remove yourself; leave the group instead".to_string()));
    }
    require_admin(&state, &group_id, &auth_user.user_id).await?;

    if !db::groups::remove_member(&state.pool, &group_id, &member_id).await? {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// 마지막 ADMIN은 나갈 수 없습니다. 그룹을 삭제하거나 다른 멤버를 ADMIN으로 지정해야 합니다.
pub async fn leave_group(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(group_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let membership = require_member(&state, &group_id, &auth_user.user_id).await?;

    if membership.role == Role::Admin && db::groups::count_admins(&state.pool, &group_id).await? <= 1
    {
        return Err(AppError::BadRequest(
            "Cannot leave the group as its only admin".to_string(),
        ));
    }

    db::groups::remove_member(&state.pool, &group_id, &auth_user.user_id).await?;

    Ok(Json(json!({ "message": "Left group successfully" })))
}

pub async fn promote_group_member(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((group_id, member_id)): Path<(String, String)>,
) -> Result<Json<Membership>, AppError> {
    require_admin(&state, &group_id, &auth_user.user_id).await?;

    let target = db::groups::get_membership(&state.pool, &group_id, &member_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if target.role == Role::Admin {
        return Err(AppError::Conflict("User is already an admin".to_string()));
    }

    let membership = db::groups::set_role(&state.pool, &group_id, &member_id, Role::Admin)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(membership))
}

/// 멤버가 자신의 개인 습관 하나를 그룹 습관에 연결합니다. 멤버당 하나만 가능합니다.
pub async fn join_group_habit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(group_id): Path<String>,
    Json(req): Json<JoinGroupHabitRequest>,
) -> Result<(StatusCode, Json<Participation>), AppError> {
    require_member(&state, &group_id, &auth_user.user_id).await?;
    let group_habit = load_group_habit(&state, &group_id).await?;

    let habit = db::habits::get_user_habit(&state.pool, &req.habit_id, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if db::groups::get_participation(&state.pool, &group_habit.id, &auth_user.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Already participating in this group habit".to_string()));
    }

    let participation = db::groups::create_participation(
        &state.pool,
        &group_habit.id,
        &auth_user.user_id,
        &habit.id,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(participation)))
}

pub async fn leave_group_habit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(group_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_member(&state, &group_id, &auth_user.user_id).await?;
    let group_habit = load_group_habit(&state, &group_id).await?;

    if !db::groups::delete_participation(&state.pool, &group_habit.id, &auth_user.user_id).await? {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}
