//! # 사용자/친구 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/users/profile/{user_id}`                   → 프로필 조회 (관계에 따라 공개 범위가 다름)
//! - `PUT    /api/v1/users/profile`                             → 내 프로필 수정
//! - `GET    /api/v1/users/friends/{user_id}`                   → 친구 목록 (본인 또는 친구만)
//! - `DELETE /api/v1/users/friends/{user_id}`                   → 친구 끊기
//! - `GET    /api/v1/users/friend-requests`                     → 받은 친구 요청
//! - `POST   /api/v1/users/friend-requests`                     → 친구 요청 보내기
//! - `PUT    /api/v1/users/friend-requests/{request_id}/accept` → 수락
//! - `DELETE /api/v1/users/friend-requests/{request_id}`        → 거절
//!
//! ## 프로필 공개 범위
//! | 조회자 | 보이는 필드 |
//! |--------|-------------|
//! | 본인 | 전체 (`UserResponse`) |
//! | 친구 | username, full_name, total_friend_count |
//! | 그 외 | username, total_friend_count |

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::{
        auth::{hash_password, validate_email, validate_password, validate_username, verify_password},
        AppState,
    },
    services::{period::DayStart, recalc},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = db::users::find_by_id(&state.pool, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if user.id == auth_user.user_id {
        return Ok(Json(ProfileResponse::Own(user.into())));
    }

    let is_friend = db::friends::are_friends(&state.pool, &auth_user.user_id, &user.id).await?;
    let total_friend_count = db::friends::count_friends(&state.pool, &user.id).await?;

    Ok(Json(ProfileResponse::Public(PublicProfile {
        username: user.username,
        full_name: is_friend.then_some(user.full_name),
        total_friend_count,
    })))
}

/// `PUT /users/profile` — 부분 업데이트
///
/// `day_start`가 바뀌면 내 모든 습관의 스트릭을 새 기준으로 다시 계산합니다.
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = db::users::find_by_id(&state.pool, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let password_hash = match (&req.current_password, &req.new_password) {
        (None, None) => None,
        (Some(current), Some(new)) => {
            if !verify_password(current, &user.password_hash)? {
                return Err(AppError::Unauthorized("Current password is incorrect".to_string()));
            }
            validate_password(new)?;
            Some(hash_password(new)?)
        }
        _ => {
            return Err(AppError::BadRequest(
                "Both current_password and new_password are required to change password"
                    .to_string(),
            ))
        }
    };

    if let Some(username) = &req.username {
        validate_username(username)?;
        if let Some(existing) = db::users::find_by_username(&state.pool, username).await? {
            if existing.id != user.id {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
        }
    }

    if let Some(email) = &req.email {
        validate_email(email)?;
        if let Some(existing) = db::users::find_by_email(&state.pool, email).await? {
            if existing.id != user.id {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
    }

    // 저장 전에 "HH:MM" 형식을 검증하고 정규화합니다
    let day_start = req
        .day_start
        .as_deref()
        .map(|value| {
            value
                .parse::<DayStart>()
                .map_err(|e| AppError::BadRequest(e.to_string()))
        })
        .transpose()?
        .map(|day_start| day_start.to_string());
    let day_start_changed = day_start
        .as_deref()
        .is_some_and(|value| value != user.day_start);

    let updated = db::users::update_profile(
        &state.pool,
        &user.id,
        req.full_name.as_deref().map(str::trim),
        req.email.as_deref(),
        req.username.as_deref(),
        password_hash.as_deref(),
        day_start.as_deref(),
    )
    .await?
    .ok_or(AppError::NotFound)?;

    if day_start_changed {
        let now = Utc::now();
        let habits = db::habits::list_habits(&state.pool, &updated.id).await?;
        tracing::info!(
            user_id = %updated.id,
            day_start = %updated.day_start,
            habits = habits.len(),
            "day start changed, recalculating streaks"
        );
        for habit in &habits {
            recalc::refresh_habit_streak_best_effort(&state.pool, habit, now).await;
        }
    }

    Ok(Json(updated.into()))
}

/// 본인 또는 친구만 친구 목록을 볼 수 있습니다.
pub async fn list_friends(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    db::users::find_by_id(&state.pool, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if user_id != auth_user.user_id
        && !db::friends::are_friends(&state.pool, &auth_user.user_id, &user_id).await?
    {
        return Err(AppError::Forbidden("Only friends can see this friend list".to_string()));
    }

    let friends = db::friends::list_friends(&state.pool, &user_id).await?;
    Ok(Json(json!({ "friends": friends })))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !db::friends::delete_friendship(&state.pool, &auth_user.user_id, &user_id).await? {
        return Err(AppError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_friend_requests(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let requests = db::friends::list_pending_requests(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "friend_requests": requests })))
}

pub async fn send_friend_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(req): Json<SendFriendRequest>,
) -> Result<(StatusCode, Json<FriendRequest>), AppError> {
    if req.user_id == auth_user.user_id {
        return Err(AppError::BadRequest("Cannot send a friend request to yourself".to_string()));
    }

    db::users::find_by_id(&state.pool, &req.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if db::friends::are_friends(&state.pool, &auth_user.user_id, &req.user_id).await? {
        return Err(AppError::Conflict("Already friends".to_string()));
    }
    if db::friends::has_pending_request(&state.pool, &auth_user.user_id, &req.user_id).await? {
        return Err(AppError::Conflict("Friend request already pending".to_string()));
    }

    let request =
        db::friends::create_friend_request(&state.pool, &auth_user.user_id, &req.user_id).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// 요청을 받은 사람만 수락할 수 있습니다.
pub async fn accept_friend_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<Friendship>, AppError> {
    let request = db::friends::get_friend_request(&state.pool, &request_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if request.receiver_id != auth_user.user_id {
        return Err(AppError::Forbidden("Only the receiver can accept this request".to_string()));
    }

    let friendship = db::friends::accept_friend_request(&state.pool, &request).await?;
    Ok(Json(friendship))
}

pub async fn reject_friend_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(request_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let request = db::friends::get_friend_request(&state.pool, &request_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if request.receiver_id != auth_user.user_id {
        return Err(AppError::Forbidden("Only the receiver can reject this request".to_string()));
    }

    db::friends::delete_friend_request(&state.pool, &request.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
