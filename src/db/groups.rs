//! # 그룹 데이터베이스 쿼리 모듈
//!
//! 그룹(`habit_groups`), 멤버십, 그룹 습관, 참여 기록을 다룹니다.
//!
//! 그룹 하나에는 정확히 하나의 그룹 습관과 하나의 그룹 대화방이 있으며,
//! 셋 모두 `create_group()`의 트랜잭션 안에서 함께 만들어집니다.

use crate::error::AppError;
use crate::models::{CreateGroupRequest, Group, GroupHabit, Membership, Participation, Role};
use sqlx::SqlitePool;

/// 그룹, 멤버십, 그룹 습관, 그룹 대화방을 한 트랜잭션으로 만듭니다.
///
/// 생성자는 ADMIN, `member_ids`의 나머지 사용자는 USER가 됩니다.
/// `member_ids`에 생성자나 중복 ID가 있으면 무시합니다.
pub async fn create_group(
    pool: &SqlitePool,
    creator_id: &str,
    req: &CreateGroupRequest,
    day_start: &str,
) -> Result<Group, AppError> {
    let group_id = uuid::Uuid::now_v7().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO habit_groups (id, name, description, creator_id) VALUES (?, ?, ?, ?)")
        .bind(&group_id)
        .bind(&req.name)
        .bind(req.description.as_deref().unwrap_or(""))
        .bind(creator_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO memberships (group_id, user_id, role) VALUES (?, ?, ?)")
        .bind(&group_id)
        .bind(creator_id)
        .bind(Role::Admin)
        .execute(&mut *tx)
        .await?;

    let mut added: Vec<&str> = vec![creator_id];
    for member_id in req.member_ids.iter().flatten() {
        if added.contains(&member_id.as_str()) {
            continue;
        }
        sqlx::query("INSERT INTO memberships (group_id, user_id, role) VALUES (?, ?, ?)")
            .bind(&group_id)
            .bind(member_id)
            .bind(Role::User)
            .execute(&mut *tx)
            .await?;
        added.push(member_id);
    }

    sqlx::query(
        r#"
        INSERT INTO group_habits (id, group_id, title, frequency_count, frequency_period, goal_streak, day_start)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(uuid::Uuid::now_v7().to_string())
    .bind(&group_id)
    .bind(&req.habit_title)
    .bind(req.frequency_count)
    .bind(req.frequency_period)
    .bind(req.goal_streak)
    .bind(day_start)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO conversations (id, is_group, group_id) VALUES (?, 1, ?)")
        .bind(uuid::Uuid::now_v7().to_string())
        .bind(&group_id)
        .execute(&mut *tx)
        .await?;

    let group = sqlx::query_as::<_, Group>(
        "SELECT id, name, description, creator_id, created_at, updated_at FROM habit_groups WHERE id = ?",
    )
    .bind(&group_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(group)
}

pub async fn get_group(pool: &SqlitePool, id: &str) -> Result<Option<Group>, AppError> {
    let group = sqlx::query_as::<_, Group>(
        "SELECT id, name, description, creator_id, created_at, updated_at FROM habit_groups WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(group)
}

/// 사용자가 속한 그룹 목록 (최근 수정순)
pub async fn list_groups_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Group>, AppError> {
    let groups = sqlx::query_as::<_, Group>(
        r#"
        SELECT g.id, g.name, g.description, g.creator_id, g.created_at, g.updated_at
        FROM habit_groups g
        JOIN memberships m ON m.group_id = g.id
        WHERE m.user_id = ?
        ORDER BY g.updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(groups)
}

pub async fn update_group(
    pool: &SqlitePool,
    id: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Group>, AppError> {
    sqlx::query(
        r#"
        UPDATE habit_groups
        SET name = COALESCE(?, name),
            description = COALESCE(?, description),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(id)
    .execute(pool)
    .await?;

    get_group(pool, id).await
}

/// 그룹을 삭제합니다. 멤버십, 그룹 습관, 참여 기록, 그룹 대화방은 CASCADE로 삭제됩니다.
pub async fn delete_group(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM habit_groups WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_membership(
    pool: &SqlitePool,
    group_id: &str,
    user_id: &str,
) -> Result<Option<Membership>, AppError> {
    let membership = sqlx::query_as::<_, Membership>(
        "SELECT group_id, user_id, role, joined_at FROM memberships WHERE group_id = ? AND user_id = ?",
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(membership)
}

pub async fn list_memberships(pool: &SqlitePool, group_id: &str) -> Result<Vec<Membership>, AppError> {
    let memberships = sqlx::query_as::<_, Membership>(
        "SELECT group_id, user_id, role, joined_at FROM memberships WHERE group_id = ? ORDER BY joined_at",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(memberships)
}

pub async fn add_member(
    pool: &SqlitePool,
    group_id: &str,
    user_id: &str,
    role: Role,
) -> Result<Membership, AppError> {
    sqlx::query("INSERT INTO memberships (group_id, user_id, role) VALUES (?, ?, ?)")
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;

    get_membership(pool, group_id, user_id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created membership".to_string()))
}

/// 멤버를 그룹에서 제거하고, 그 멤버의 그룹 습관 참여 기록도 함께 지웁니다.
pub async fn remove_member(pool: &SqlitePool, group_id: &str, user_id: &str) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM habit_participations
        WHERE user_id = ?
          AND group_habit_id IN (SELECT id FROM group_habits WHERE group_id = ?)
        "#,
    )
    .bind(user_id)
    .bind(group_id)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query("DELETE FROM memberships WHERE group_id = ? AND user_id = ?")
        .bind(group_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_admins(pool: &SqlitePool, group_id: &str) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM memberships WHERE group_id = ? AND role = ?",
    )
    .bind(group_id)
    .bind(Role::Admin)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn set_role(
    pool: &SqlitePool,
    group_id: &str,
    user_id: &str,
    role: Role,
) -> Result<Option<Membership>, AppError> {
    sqlx::query("UPDATE memberships SET role = ? WHERE group_id = ? AND user_id = ?")
        .bind(role)
        .bind(group_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    get_membership(pool, group_id, user_id).await
}

pub async fn get_group_habit(pool: &SqlitePool, group_id: &str) -> Result<Option<GroupHabit>, AppError> {
    let habit = sqlx::query_as::<_, GroupHabit>(
        r#"
        SELECT id, group_id, title, frequency_count, frequency_period, goal_streak, day_start, created_at
        FROM group_habits
        WHERE group_id = ?
        "#,
    )
    .bind(group_id)
    .fetch_optional(pool)
    .await?;

    Ok(habit)
}

pub async fn list_participations(
    pool: &SqlitePool,
    group_habit_id: &str,
) -> Result<Vec<Participation>, AppError> {
    let participations = sqlx::query_as::<_, Participation>(
        r#"
        SELECT id, group_habit_id, user_id, habit_id, joined_at
        FROM habit_participations
        WHERE group_habit_id = ?
        ORDER BY joined_at
        "#,
    )
    .bind(group_habit_id)
    .fetch_all(pool)
    .await?;

    Ok(participations)
}

/// 개인 습관 하나에 연결된 그룹 참여 기록들 (습관 상세 응답용)
pub async fn list_participations_for_habit(
    pool: &SqlitePool,
    habit_id: &str,
) -> Result<Vec<Participation>, AppError> {
    let participations = sqlx::query_as::<_, Participation>(
        r#"
        SELECT id, group_habit_id, user_id, habit_id, joined_at
        FROM habit_participations
        WHERE habit_id = ?
        ORDER BY joined_at
        "#,
    )
    .bind(habit_id)
    .fetch_all(pool)
    .await?;

    Ok(participations)
}

pub async fn get_participation(
    pool: &SqlitePool,
    group_habit_id: &str,
    user_id: &str,
) -> Result<Option<Participation>, AppError> {
    let participation = sqlx::query_as::<_, Participation>(
        r#"
        SELECT id, group_habit_id, user_id, habit_id, joined_at
        FROM habit_participations
        WHERE group_habit_id = ? AND user_id = ?
        "#,
    )
    .bind(group_habit_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(participation)
}

pub async fn create_participation(
    pool: &SqlitePool,
    group_habit_id: &str,
    user_id: &str,
    habit_id: &str,
) -> Result<Participation, AppError> {
    sqlx::query(
        "INSERT INTO habit_participations (id, group_habit_id, user_id, habit_id) VALUES (?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::now_v7().to_string())
    .bind(group_habit_id)
    .bind(user_id)
    .bind(habit_id)
    .execute(pool)
    .await?;

    get_participation(pool, group_habit_id, user_id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created participation".to_string()))
}

pub async fn delete_participation(
    pool: &SqlitePool,
    group_habit_id: &str,
    user_id: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM habit_participations WHERE group_habit_id = ? AND user_id = ?")
        .bind(group_habit_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_group_conversation_id(
    pool: &SqlitePool,
    group_id: &str,
) -> Result<Option<String>, AppError> {
    let id = sqlx::query_scalar::<_, String>("SELECT id FROM conversations WHERE group_id = ?")
        .bind(group_id)
        .fetch_optional(pool)
        .await?;

    Ok(id)
}
