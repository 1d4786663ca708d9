//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! SQLite와 직접 상호작용하는 함수들을 모아둔 모듈입니다.
//! 라우트 핸들러(routes/)와 스트릭 재계산 서비스(services::recalc)가 이 모듈을 호출합니다.
//!
//! 각 하위 모듈:
//! - `users`: 사용자 계정, 프로필, refresh 토큰
//! - `friends`: 친구 요청과 친구 관계
//! - `habits`: 습관 CRUD
//! - `trackings`: 습관 트래킹 기록 CRUD
//! - `streaks`: 스트릭 행 조회/upsert
//! - `groups`: 그룹, 멤버십, 그룹 습관, 참여
//! - `conversations`: 대화방과 메시지
//!
//! 함수 이름이 모듈끼리 겹치므로(`get_*`, `delete_*`) 재공개하지 않고
//! `db::habits::get_habit`처럼 모듈 경로로 호출합니다.

pub mod conversations;
pub mod friends;
pub mod groups;
pub mod habits;
pub mod streaks;
pub mod trackings;
pub mod users;

/// 테스트용 인메모리 DB 풀
///
/// `sqlite::memory:`는 연결마다 별도 DB가 생기므로 연결 하나를 끝까지 유지합니다.
#[cfg(test)]
pub async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    pool
}

/// 테스트 픽스처: 최소 필드만 채운 사용자를 만듭니다.
#[cfg(test)]
pub async fn seed_user(pool: &sqlx::SqlitePool, id: &str, day_start: &str) {
    users::create_user(
        pool,
        id,
        id,
        &format!("{id}@example.com"),
        &id.to_uppercase(),
        "hash",
        day_start,
    )
    .await
    .expect("seed user");
}
