//! # 애플리케이션 설정(Configuration) 모듈
//!
//! `.env` 파일이나 시스템 환경변수에서 서버 설정값을 읽어옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: JWT 토큰 서명에 사용할 비밀키 (필수)
//! - `HOST`: 서버 바인딩 주소 (기본값 "0.0.0.0")
//! - `PORT`: 서버 포트 번호 (기본값 3000)
//! - `DATABASE_MAX_CONNECTIONS`: 연결 풀 크기 (기본값 5)
//! - `DEFAULT_DAY_START`: 신규 사용자/그룹 습관의 하루 시작 시각 (기본값 "00:00")

use std::env;

use thiserror::Error;

use crate::{error::StreakError, services::period::DayStart};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid DEFAULT_DAY_START: {0}")]
    InvalidDayStart(#[from] StreakError),
}

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 경로 (예: "sqlite:data/habitrail.db?mode=rwc")
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub default_day_start: DayStart,
}

impl Config {
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수입니다.
    /// 숫자 설정은 파싱에 실패하면 기본값을 쓰지만,
    /// `DEFAULT_DAY_START`가 "HH:MM" 형식이 아니면 서버를 시작하지 않습니다.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(3000),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(5),
            default_day_start: match env::var("DEFAULT_DAY_START") {
                Ok(value) => value.parse()?,
                Err(_) => DayStart::MIDNIGHT,
            },
        })
    }
}
