//! # 대화방(Conversation) 데이터베이스 쿼리 모듈
//!
//! 1:1 대화방은 `conversation_participants`로 참여자를 관리하고,
//! 그룹 대화방(`group_id` 설정)은 그룹 멤버십으로 접근을 판단합니다.

use crate::error::AppError;
use crate::models::{Conversation, ConversationParticipant, Message};
use sqlx::SqlitePool;

pub async fn get_conversation(pool: &SqlitePool, id: &str) -> Result<Option<Conversation>, AppError> {
    let conversation = sqlx::query_as::<_, Conversation>(
        "SELECT id, is_group, group_id, created_at, updated_at FROM conversations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(conversation)
}

/// 사용자가 참여한 1:1 대화방 목록 (최근 활동순)
pub async fn list_direct_conversations(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Conversation>, AppError> {
    let conversations = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT c.id, c.is_group, c.group_id, c.created_at, c.updated_at
        FROM conversations c
        JOIN conversation_participants p ON p.conversation_id = c.id
        WHERE p.user_id = ? AND c.is_group = 0
        ORDER BY c.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(conversations)
}

pub async fn list_participants(
    pool: &SqlitePool,
    conversation_id: &str,
) -> Result<Vec<ConversationParticipant>, AppError> {
    let participants = sqlx::query_as::<_, ConversationParticipant>(
        r#"
        SELECT conversation_id, user_id, joined_at
        FROM conversation_participants
        WHERE conversation_id = ?
        ORDER BY joined_at
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(participants)
}

pub async fn is_participant(
    pool: &SqlitePool,
    conversation_id: &str,
    user_id: &str,
) -> Result<bool, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM conversation_participants WHERE conversation_id = ? AND user_id = ?",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// 두 사용자 사이의 1:1 대화방 ID
pub async fn find_direct_conversation(
    pool: &SqlitePool,
    user_a: &str,
    user_b: &str,
) -> Result<Option<String>, AppError> {
    let id = sqlx::query_scalar::<_, String>(
        r#"
        SELECT c.id
        FROM conversations c
        JOIN conversation_participants a ON a.conversation_id = c.id AND a.user_id = ?
        JOIN conversation_participants b ON b.conversation_id = c.id AND b.user_id = ?
        WHERE c.is_group = 0
        LIMIT 1
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// 1:1 대화방과 두 참여자 행을 한 트랜잭션으로 만듭니다.
pub async fn create_direct_conversation(
    pool: &SqlitePool,
    user_a: &str,
    user_b: &str,
) -> Result<Conversation, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO conversations (id, is_group) VALUES (?, 0)")
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    for user_id in [user_a, user_b] {
        sqlx::query("INSERT INTO conversation_participants (conversation_id, user_id) VALUES (?, ?)")
            .bind(&id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    let conversation = sqlx::query_as::<_, Conversation>(
        "SELECT id, is_group, group_id, created_at, updated_at FROM conversations WHERE id = ?",
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(conversation)
}

/// 대화방의 메시지 (최신순)
pub async fn list_messages(pool: &SqlitePool, conversation_id: &str) -> Result<Vec<Message>, AppError> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, sender_id, content, created_at
        FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

/// 메시지를 저장하고 대화방의 `updated_at`을 갱신합니다.
pub async fn create_message(
    pool: &SqlitePool,
    conversation_id: &str,
    sender_id: &str,
    content: &str,
) -> Result<Message, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO messages (id, conversation_id, sender_id, content) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "UPDATE conversations SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(conversation_id)
    .execute(&mut *tx)
    .await?;

    let message = sqlx::query_as::<_, Message>(
        "SELECT id, conversation_id, sender_id, content, created_at FROM messages WHERE id = ?",
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(message)
}

pub async fn get_message(pool: &SqlitePool, id: &str) -> Result<Option<Message>, AppError> {
    let message = sqlx::query_as::<_, Message>(
        "SELECT id, conversation_id, sender_id, content, created_at FROM messages WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

pub async fn delete_message(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{groups, seed_user, test_pool};

    #[tokio::test]
    async fn test_direct_conversation_flow() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "00:00").await;
        seed_user(&pool, "bob", "00:00").await;
        seed_user(&pool, "carol", "00:00").await;

        assert!(find_direct_conversation(&pool, "alice", "bob").await.unwrap().is_none());
        let conversation = create_direct_conversation(&pool, "alice", "bob").await.unwrap();
        assert!(!conversation.is_group);

        assert_eq!(
            find_direct_conversation(&pool, "bob", "alice").await.unwrap(),
            Some(conversation.id.clone())
        );
        assert!(find_direct_conversation(&pool, "alice", "carol").await.unwrap().is_none());
        assert!(is_participant(&pool, &conversation.id, "bob").await.unwrap());
        assert!(!is_participant(&pool, &conversation.id, "carol").await.unwrap());
        assert_eq!(list_participants(&pool, &conversation.id).await.unwrap().len(), 2);

        let first = create_message(&pool, &conversation.id, "alice", "hi").await.unwrap();
        let second = create_message(&pool, &conversation.id, "bob", "hey").await.unwrap();

        let messages = list_messages(&pool, &conversation.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.id == second.id && m.sender_id == "bob"));

        assert!(delete_message(&pool, &first.id).await.unwrap());
        assert!(get_message(&pool, &first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_group_conversation_is_not_listed_as_direct() {
        let pool = test_pool().await;
        seed_user(&pool, "alice", "00:00").await;
        seed_user(&pool, "bob", "00:00").await;

        let group = groups::create_group(
            &pool,
            "alice",
            &groups::tests::group_request(&["bob"]),
            "00:00",
        )
        .await
        .unwrap();
        let conversation_id = groups::get_group_conversation_id(&pool, &group.id)
            .await
            .unwrap()
            .unwrap();
        let conversation = get_conversation(&pool, &conversation_id).await.unwrap().unwrap();
        assert!(conversation.is_group);
        assert_eq!(conversation.group_id.as_deref(), Some(group.id.as_str()));

        assert!(list_direct_conversations(&pool, "alice").await.unwrap().is_empty());
    }
}
