//! # 기간(Period) 계산 모듈
//!
//! 타임스탬프를 "기간 버킷" 문자열 키로 바꾸는 순수 함수들입니다.
//! 스트릭 엔진(`services::streak`)의 가장 아래 계층에 해당합니다.
//!
//! ## 구성 요소
//! - `DayStart`: 사용자가 정한 하루 시작 시각 ("HH:MM", UTC)
//! - `adjust_to_effective_day()`: 타임스탬프를 "유효한 날"의 시작 시각으로 이동
//! - `period_key()`: 일/주/월 버킷 키 생성
//! - `is_consecutive()`: 두 버킷 키가 정확히 한 기간 차이인지 판정
//!
//! 모든 계산은 UTC 기준이며, 로컬 시간대나 "현재 시각"에 의존하지 않습니다.
//!
//! ## 키 형식
//! | 주기 | 형식 | 예시 |
//! |------|------|------|
//! | day | `YYYY-MM-DD` | `2025-02-06` |
//! | week | 그 주 월요일의 `YYYY-MM-DD` | `2025-01-27` |
//! | month | `YYYY-MM` | `2025-02` |

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use std::{fmt, str::FromStr};

use crate::{error::StreakError, models::FrequencyPeriod};

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
const MONTH_KEY_FORMAT: &str = "%Y-%m";

/// DB에 저장하는 타임스탬프 형식 (밀리초 정밀도, UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// 사용자의 하루 시작 시각
///
/// 예: `05:00`이면 새벽 4시 59분의 기록은 전날로 집계됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayStart(NaiveTime);

impl DayStart {
    pub const MIDNIGHT: DayStart = DayStart(NaiveTime::MIN);

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl Default for DayStart {
    fn default() -> Self {
        Self::MIDNIGHT
    }
}

impl FromStr for DayStart {
    type Err = StreakError;

    /// "HH:MM" (24시간제, 숫자 두 자리씩)만 허용합니다. "5:00", "+5:00", "24:00", "05:60"은 거부됩니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StreakError::InvalidDayStart(s.to_string());

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hour) || !two_digits(minute) {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;

        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(DayStart)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for DayStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// 타임스탬프를 사용자의 "유효한 날" 시작 시각으로 이동합니다.
///
/// 1. 같은 UTC 날짜의 `HH:MM:00.000`을 후보로 만들고
/// 2. 원래 시각이 후보 **이하**(`<=`)이면 전날로 간주해 하루를 뺍니다.
///
/// 경계 시각과 정확히 같은 기록도 전날에 속합니다.
pub fn adjust_to_effective_day(timestamp: DateTime<Utc>, day_start: DayStart) -> DateTime<Utc> {
    let candidate = timestamp.date_naive().and_time(day_start.0).and_utc();

    if timestamp <= candidate {
        candidate - Duration::days(1)
    } else {
        candidate
    }
}

/// 타임스탬프가 속하는 기간 버킷의 키를 반환합니다.
pub fn period_key(timestamp: DateTime<Utc>, period: FrequencyPeriod, day_start: DayStart) -> String {
    let effective_day = adjust_to_effective_day(timestamp, day_start).date_naive();

    match period {
        FrequencyPeriod::Day => effective_day.format(DAY_KEY_FORMAT).to_string(),
        FrequencyPeriod::Week => week_monday(effective_day).format(DAY_KEY_FORMAT).to_string(),
        FrequencyPeriod::Month => effective_day.format(MONTH_KEY_FORMAT).to_string(),
    }
}

/// newest-first로 정렬된 목록에서 `earlier_key`(앞 원소)가
/// `later_key`(현재 원소)보다 정확히 한 기간 뒤(더 최근)인지 판정합니다.
pub fn is_consecutive(
    earlier_key: &str,
    later_key: &str,
    period: FrequencyPeriod,
) -> Result<bool, StreakError> {
    let newer = parse_period_key(earlier_key, period)?;
    let older = parse_period_key(later_key, period)?;

    let consecutive = match period {
        FrequencyPeriod::Day => (newer - older).num_days() == 1,
        FrequencyPeriod::Week => (week_monday(newer) - week_monday(older)).num_days() == 7,
        FrequencyPeriod::Month => month_index(newer) - month_index(older) == 1,
    };

    Ok(consecutive)
}

/// `period_key()`가 만든 키를 그 기간의 첫 날짜로 되돌립니다.
///
/// 월 키("2025-02")는 그 달 1일로 해석합니다.
pub fn parse_period_key(key: &str, period: FrequencyPeriod) -> Result<NaiveDate, StreakError> {
    let parsed = match period {
        FrequencyPeriod::Day | FrequencyPeriod::Week => {
            NaiveDate::parse_from_str(key, DAY_KEY_FORMAT)
        }
        FrequencyPeriod::Month => NaiveDate::parse_from_str(&format!("{key}-01"), DAY_KEY_FORMAT),
    };

    parsed.map_err(|_| StreakError::InvalidPeriodKey(key.to_string()))
}

/// 저장된 타임스탬프 문자열(RFC 3339)을 UTC 시각으로 파싱합니다.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StreakError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StreakError::InvalidTimestamp(value.to_string()))
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}
