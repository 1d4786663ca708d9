//! # 데이터 모델 모듈
//!
//! DB 행과 HTTP 요청/응답에 쓰이는 구조체들을 도메인별로 나눠 정의합니다.
//! - `user`: 사용자, 인증 요청/응답, 프로필
//! - `friend`: 친구 요청과 친구 관계
//! - `habit`: 습관, 트래킹 기록, 스트릭
//! - `group`: 그룹, 멤버십, 그룹 습관과 참여
//! - `conversation`: 대화방과 메시지
//!
//! `pub use X::*;`로 재공개하므로 `crate::models::Habit`처럼 짧게 접근할 수 있습니다.

pub mod conversation;
pub mod friend;
pub mod group;
pub mod habit;
pub mod user;

pub use conversation::*;
pub use friend::*;
pub use group::*;
pub use habit::*;
pub use user::*;
