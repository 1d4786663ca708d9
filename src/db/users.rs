use crate::error::AppError;
use crate::models::user::User;
use sqlx::SqlitePool;

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, day_start, \
                            onboarding_completed, created_at, updated_at";

pub async fn create_user(
    pool: &SqlitePool,
    id: &str,
    username: &str,
    email: &str,
    full_name: &str,
    password_hash: &str,
    day_start: &str,
) -> Result<User, AppError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, full_name, password_hash, day_start)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(full_name)
    .bind(password_hash)
    .bind(day_start)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created user".to_string()))
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// 로그인은 username과 email 모두 받습니다. username에는 '@'가 없으므로 둘이 겹치지 않습니다.
pub async fn find_by_username_or_email(
    pool: &SqlitePool,
    identifier: &str,
) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ?"
    ))
    .bind(identifier)
    .bind(identifier)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// 프로필 부분 업데이트. `None`인 필드는 기존 값을 유지합니다.
///
/// day_start를 설정하면 온보딩 완료로 표시합니다.
pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    full_name: Option<&str>,
    email: Option<&str>,
    username: Option<&str>,
    password_hash: Option<&str>,
    day_start: Option<&str>,
) -> Result<Option<User>, AppError> {
    sqlx::query(
        r#"
        UPDATE users
        SET full_name = COALESCE(?, full_name),
            email = COALESCE(?, email),
            username = COALESCE(?, username),
            password_hash = COALESCE(?, password_hash),
            day_start = COALESCE(?, day_start),
            onboarding_completed = CASE WHEN ? IS NULL THEN onboarding_completed ELSE 1 END,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .bind(day_start)
    .bind(day_start)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id).await
}

pub async fn store_refresh_token(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    token_hash: &str,
    expires_at: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_refresh_token(
    pool: &SqlitePool,
    token_hash: &str,
) -> Result<Option<(String, String, String)>, AppError> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        r#"
        SELECT id, user_id, expires_at
        FROM refresh_tokens
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn delete_refresh_token(pool: &SqlitePool, token_hash: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn delete_user_refresh_tokens(pool: &SqlitePool, user_id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_login_lookup_by_username_or_email() {
        let pool = test_pool().await;
        create_user(&pool, "u1", "alice", "alice@example.com", "Alice", "hash", "00:00")
            .await
            .unwrap();

        let by_name = find_by_username_or_email(&pool, "alice").await.unwrap().unwrap();
        let by_email = find_by_username_or_email(&pool, "alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, "u1");
        assert_eq!(by_email.id, "u1");
        assert!(find_by_username_or_email(&pool, "bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_setting_day_start_completes_onboarding() {
        let pool = test_pool().await;
        let user = create_user(&pool, "u1", "alice", "alice@example.com", "Alice", "hash", "00:00")
            .await
            .unwrap();
        assert!(!user.onboarding_completed);

        let renamed = update_profile(&pool, "u1", Some("Alice A."), None, None, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.full_name, "Alice A.");
        assert!(!renamed.onboarding_completed);

        let updated = update_profile(&pool, "u1", None, None, None, None, Some("05:30"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.day_start, "05:30");
        assert_eq!(updated.full_name, "Alice A.");
        assert!(updated.onboarding_completed);
    }
}
