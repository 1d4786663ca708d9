//! # 대화방(Conversation) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/conversations`                                        → 내 1:1 대화방 목록
//! - `GET    /api/v1/conversations/{conversation_id}`                      → 대화방 + 메시지
//! - `POST   /api/v1/conversations/direct/{user_id}`                       → 1:1 대화방 생성
//! - `POST   /api/v1/conversations/{conversation_id}/messages`             → 메시지 보내기
//! - `DELETE /api/v1/conversations/{conversation_id}/messages/{message_id}` → 내 메시지 삭제
//!
//! 접근 권한이 없는 대화방은 존재 여부를 드러내지 않도록 404로 응답합니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    routes::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

/// 1:1 대화방은 참여자, 그룹 대화방은 그룹 멤버만 접근할 수 있습니다.
async fn accessible_conversation(
    state: &AppState,
    conversation_id: &str,
    user_id: &str,
) -> Result<Conversation, AppError> {
    let conversation = db::conversations::get_conversation(&state.pool, conversation_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let allowed = match conversation.group_id.as_deref() {
        Some(group_id) => db::groups::get_membership(&state.pool, group_id, user_id)
            .await?
            .is_some(),
        None => db::conversations::is_participant(&state.pool, conversation_id, user_id).await?,
    };

    if !allowed {
        return Err(AppError::NotFound);
    }

    Ok(conversation)
}

async fn load_detail(state: &AppState, conversation: Conversation) -> Result<ConversationDetail, AppError> {
    let participants = db::conversations::list_participants(&state.pool, &conversation.id).await?;
    let messages = db::conversations::list_messages(&state.pool, &conversation.id).await?;

    Ok(ConversationDetail {
        conversation,
        participants,
        messages,
    })
}

pub async fn list_conversations(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let conversations =
        db::conversations::list_direct_conversations(&state.pool, &auth_user.user_id).await?;

    let mut details = Vec::with_capacity(conversations.len());
    for conversation in conversations {
        details.push(load_detail(&state, conversation).await?);
    }

    Ok(Json(json!({ "conversations": details })))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationDetail>, AppError> {
    let conversation = accessible_conversation(&state, &conversation_id, &auth_user.user_id).await?;
    Ok(Json(load_detail(&state, conversation).await?))
}

pub async fn create_direct_conversation(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<(StatusCode, Json<ConversationDetail>), AppError> {
    if user_id == auth_user.user_id {
        return Err(AppError::BadRequest("Cannot start a conversation with yourself".to_string()));
    }

    db::users::find_by_id(&state.pool, &user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if db::conversations::find_direct_conversation(&state.pool, &auth_user.user_id, &user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Conversation already exists".to_string()));
    }

    let conversation =
        db::conversations::create_direct_conversation(&state.pool, &auth_user.user_id, &user_id)
            .await?;

    Ok((StatusCode::CREATED, Json(load_detail(&state, conversation).await?)))
}

pub async fn send_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(conversation_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Message content is required".to_string()));
    }

    let conversation = accessible_conversation(&state, &conversation_id, &auth_user.user_id).await?;
    let message =
        db::conversations::create_message(&state.pool, &conversation.id, &auth_user.user_id, content)
            .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// 보낸 사람만 자신의 메시지를 삭제할 수 있습니다.
pub async fn delete_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((conversation_id, message_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    accessible_conversation(&state, &conversation_id, &auth_user.user_id).await?;

    let message = db::conversations::get_message(&state.pool, &message_id)
        .await?
        .filter(|message| message.conversation_id == conversation_id)
        .ok_or(AppError::NotFound)?;

    if message.sender_id != auth_user.user_id {
        return Err(AppError::Forbidden("Only the sender can delete this message".to_string()));
    }

    db::conversations::delete_message(&state.pool, &message.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
