//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! 모든 엔드포인트는 `/api/v1` 아래에 중첩됩니다 (main.rs 참고).
//!
//! 각 하위 모듈:
//! - `auth`: 회원가입, 로그인, 토큰 갱신, 로그아웃, 내 정보
//! - `users`: 프로필, 친구, 친구 요청
//! - `habits`: 습관 CRUD와 트래킹 기록 (변경 시 스트릭 재계산)
//! - `groups`: 그룹, 멤버 관리, 그룹 습관 참여, 그룹 스트릭
//! - `conversations`: 1:1/그룹 대화방과 메시지
//! - `health`: 서버 상태 확인 (헬스체크)

pub mod auth;
pub mod conversations;
pub mod groups;
pub mod habits;
pub mod health;
pub mod users;

// main.rs에서 `routes::list_habits`처럼 바로 접근할 수 있도록 재공개합니다.
// auth 핸들러는 이름이 짧아(`login`, `me`) 모듈 경로로 호출합니다.
pub use conversations::*;
pub use groups::*;
pub use habits::*;
pub use health::*;
pub use users::*;

use sqlx::SqlitePool;

use crate::services::period::DayStart;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// SqlitePool은 내부적으로 Arc를 사용하므로 clone해도 같은 풀을 가리킵니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀
    pub pool: SqlitePool,
    /// JWT 토큰 서명용 비밀키
    pub jwt_secret: String,
    /// 회원가입 시 사용자에게, 그룹 생성 시 그룹 습관에 부여하는 기본 하루 시작 시각
    pub default_day_start: DayStart,
}
