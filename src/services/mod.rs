//! # 비즈니스 로직 계층
//!
//! - `period`: 기간 키 계산, 하루 시작 시각 보정, 인접 기간 판정 (순수 함수)
//! - `streak`: 현재/최대 스트릭과 그룹 스트릭 계산 (순수 함수)
//! - `recalc`: DB에서 트래킹 기록을 읽어 스트릭을 재계산하고 저장

pub mod period;
pub mod recalc;
pub mod streak;
