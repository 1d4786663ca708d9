//! # 친구 관계 데이터베이스 쿼리 모듈
//!
//! ## 친구 요청 라이프사이클
//! ```text
//! create_friend_request() → pending ──accept_friend_request()──▶ friendships 행 생성 + 요청 삭제
//!                                  └──delete_friend_request()──▶ 요청 삭제 (거절)
//! ```
//! friendships 행은 한 쌍당 하나만 저장하므로, 조회는 항상 양방향으로 합니다.

use crate::error::AppError;
use crate::models::{FriendRequest, FriendSummary, Friendship};
use sqlx::SqlitePool;

pub async fn create_friend_request(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
) -> Result<FriendRequest, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query("INSERT INTO friend_requests (id, sender_id, receiver_id) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(sender_id)
        .bind(receiver_id)
        .execute(pool)
        .await?;

    get_friend_request(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created friend request".to_string()))
}

pub async fn get_friend_request(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<FriendRequest>, AppError> {
    let request = sqlx::query_as::<_, FriendRequest>(
        r#"
        SELECT id, sender_id, receiver_id, status, created_at
        FROM friend_requests
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// 두 사용자 사이에 (어느 방향이든) 대기 중인 요청이 있는지 확인합니다.
pub async fn has_pending_request(
    pool: &SqlitePool,
    user_a: &str,
    user_b: &str,
) -> Result<bool, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM friend_requests
        WHERE status = 'pending'
          AND ((sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?))
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// 내가 받은 대기 중인 친구 요청 (최신순)
pub async fn list_pending_requests(
    pool: &SqlitePool,
    receiver_id: &str,
) -> Result<Vec<FriendRequest>, AppError> {
    let requests = sqlx::query_as::<_, FriendRequest>(
        r#"
        SELECT id, sender_id, receiver_id, status, created_at
        FROM friend_requests
        WHERE receiver_id = ? AND status = 'pending'
        ORDER BY created_at DESC
        "#,
    )
    .bind(receiver_id)
    .fetch_all(pool)
    .await?;

    Ok(requests)
}

/// 요청을 수락합니다. 요청 삭제와 친구 관계 생성은 하나의 트랜잭션으로 처리합니다.
pub async fn accept_friend_request(
    pool: &SqlitePool,
    request: &FriendRequest,
) -> Result<Friendship, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM friend_requests WHERE id = ?")
        .bind(&request.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO friendships (id, user_id, friend_id) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&request.sender_id)
        .bind(&request.receiver_id)
        .execute(&mut *tx)
        .await?;

    let friendship = sqlx::query_as::<_, Friendship>(
        "SELECT id, user_id, friend_id, created_at FROM friendships WHERE id = ?",
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(friendship)
}

pub async fn delete_friend_request(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM friend_requests WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn are_friends(pool: &SqlitePool, user_a: &str, user_b: &str) -> Result<bool, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM friendships
        WHERE (user_id = ? AND friend_id = ?) OR (user_id = ? AND friend_id = ?)
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// 친구 관계를 끊습니다. 어느 쪽이 요청을 보냈었는지는 상관없습니다.
pub async fn delete_friendship(
    pool: &SqlitePool,
    user_a: &str,
    user_b: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM friendships
        WHERE (user_id = ? AND friend_id = ?) OR (user_id = ? AND friend_id = ?)
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_friends(pool: &SqlitePool, user_id: &str) -> Result<Vec<FriendSummary>, AppError> {
    let friends = sqlx::query_as::<_, FriendSummary>(
        r#"
        SELECT u.id, u.username, u.full_name
        FROM friendships f
        JOIN users u ON u.id = CASE WHEN f.user_id = ? THEN f.friend_id ELSE f.user_id END
        WHERE f.user_id = ? OR f.friend_id = ?
        ORDER BY u.username
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(friends)
}

pub async fn count_friends(pool: &SqlitePool, user_id: &str) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM friendships WHERE user_id = ? OR friend_id = ?",
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
