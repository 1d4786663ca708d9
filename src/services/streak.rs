//! # 스트릭(Streak) 계산 엔진
//!
//! 트래킹 타임스탬프 목록으로부터 현재 스트릭과 최대 스트릭을 계산합니다.
//! DB에 접근하지 않는 순수 계산 모듈이며, "현재 시각"도 인자로 받습니다.
//!
//! ## 계산 흐름
//! ```text
//! 타임스탬프들 ──bucket_events()──▶ 기간별 집계(BucketTally)
//!      ──qualifying_periods(조건)──▶ 달성한 기간 목록 (최신순 정렬)
//!      ──scan_streaks()──▶ StreakSummary { current, max }
//! ```
//!
//! 개인 스트릭과 그룹 스트릭은 "어떤 기간이 달성으로 인정되는가"만 다릅니다.
//! - 개인: 그 기간의 기록 수 ≥ `frequency_count`
//! - 그룹: 그 기간을 개인적으로 달성한 멤버 수 == 전체 참여자 수 (만장일치)

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    error::StreakError,
    models::FrequencyPeriod,
    services::period::{is_consecutive, parse_period_key, period_key, DayStart},
};

/// 재계산 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub max_streak: u32,
}

/// 기간 버킷 하나의 집계
///
/// `representative`는 정렬에만 쓰이는 대표 시각입니다.
/// 개인 스트릭에서는 그 버킷에 속한 가장 최근 기록의 시각입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketTally {
    pub count: u32,
    pub representative: DateTime<Utc>,
}

/// 달성 조건을 만족한 기간
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifyingPeriod {
    pub key: String,
    pub representative: DateTime<Utc>,
}

/// 타임스탬프들을 기간 키별로 묶어 개수를 셉니다.
pub fn bucket_events(
    timestamps: &[DateTime<Utc>],
    period: FrequencyPeriod,
    day_start: DayStart,
) -> HashMap<String, BucketTally> {
    let mut buckets: HashMap<String, BucketTally> = HashMap::new();

    for &timestamp in timestamps {
        let key = period_key(timestamp, period, day_start);
        buckets
            .entry(key)
            .and_modify(|tally| {
                tally.count += 1;
                tally.representative = tally.representative.max(timestamp);
            })
            .or_insert(BucketTally {
                count: 1,
                representative: timestamp,
            });
    }

    buckets
}

/// 조건(`qualifies`)을 만족한 기간만 골라 최신순으로 정렬합니다.
pub fn qualifying_periods<I, F>(buckets: I, qualifies: F) -> Vec<QualifyingPeriod>
where
    I: IntoIterator<Item = (String, BucketTally)>,
    F: Fn(&BucketTally) -> bool,
{
    let mut periods: Vec<QualifyingPeriod> = buckets
        .into_iter()
        .filter(|(_, tally)| qualifies(tally))
        .map(|(key, tally)| QualifyingPeriod {
            key,
            representative: tally.representative,
        })
        .collect();

    // 버킷끼리는 겹치지 않으므로 대표 시각만으로 순서가 정해집니다.
    // 키 비교는 HashMap 순회 순서와 무관하게 결과를 고정하기 위한 보조 기준입니다.
    periods.sort_by(|a, b| {
        b.representative
            .cmp(&a.representative)
            .then_with(|| b.key.cmp(&a.key))
    });

    periods
}

/// 최신순으로 정렬된 달성 기간 목록에서 현재/최대 스트릭을 구합니다.
///
/// - current: 가장 최근 달성 기간이 `current_key`(지금이 속한 기간)일 때만,
///   처음부터 연속된 기간 수. 아니면 0.
/// - max: 목록 전체에서 가장 긴 연속 구간의 길이. 목록이 비면 0.
pub fn scan_streaks(
    periods: &[QualifyingPeriod],
    current_key: &str,
    period: FrequencyPeriod,
) -> Result<StreakSummary, StreakError> {
    let Some(newest) = periods.first() else {
        return Ok(StreakSummary::default());
    };

    let mut current_streak = 0;
    if newest.key == current_key {
        current_streak = 1;
        for pair in periods.windows(2) {
            if !is_consecutive(&pair[0].key, &pair[1].key, period)? {
                break;
            }
            current_streak += 1;
        }
    }

    let mut max_streak = 1;
    let mut run = 1;
    for pair in periods.windows(2) {
        if is_consecutive(&pair[0].key, &pair[1].key, period)? {
            run += 1;
        } else {
            max_streak = max_streak.max(run);
            run = 1;
        }
    }
    max_streak = max_streak.max(run);

    Ok(StreakSummary {
        current_streak,
        max_streak,
    })
}

/// 한 사용자의 한 습관에 대한 스트릭을 계산합니다.
pub fn compute_streak(
    timestamps: &[DateTime<Utc>],
    frequency_count: u32,
    period: FrequencyPeriod,
    day_start: DayStart,
    now: DateTime<Utc>,
) -> Result<StreakSummary, StreakError> {
    let buckets = bucket_events(timestamps, period, day_start);
    let periods = qualifying_periods(buckets, |tally| tally.count >= frequency_count);

    scan_streaks(&periods, &period_key(now, period, day_start), period)
}

/// 그룹 습관의 현재 스트릭을 계산합니다.
///
/// `members`는 참여자별 트래킹 타임스탬프 목록입니다.
/// 참여자가 없으면 0입니다 (빈 집합의 만장일치는 달성으로 보지 않음).
pub fn compute_group_streak(
    members: &[Vec<DateTime<Utc>>],
    frequency_count: u32,
    period: FrequencyPeriod,
    day_start: DayStart,
    now: DateTime<Utc>,
) -> Result<u32, StreakError> {
    if members.is_empty() {
        return Ok(0);
    }
    let total_members = members.len() as u32;

    // 기간 키 → 그 기간을 개인적으로 달성한 멤버 수
    let mut successes: HashMap<String, u32> = HashMap::new();
    for timestamps in members {
        for (key, tally) in bucket_events(timestamps, period, day_start) {
            if tally.count >= frequency_count {
                *successes.entry(key).or_default() += 1;
            }
        }
    }

    // 그룹 버킷의 대표 시각은 키에서 파싱한 날짜(그 기간의 첫날 자정)입니다.
    let mut buckets = Vec::with_capacity(successes.len());
    for (key, count) in successes {
        let representative = parse_period_key(&key, period)?
            .and_time(NaiveTime::MIN)
            .and_utc();
        buckets.push((key, BucketTally { count, representative }));
    }

    let periods = qualifying_periods(buckets, |tally| tally.count == total_members);
    let summary = scan_streaks(&periods, &period_key(now, period, day_start), period)?;

    Ok(summary.current_streak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::period::parse_timestamp;

    fn ts(value: &str) -> DateTime<Utc> {
        parse_timestamp(value).unwrap()
    }

    fn all(values: &[&str]) -> Vec<DateTime<Utc>> {
        values.iter().map(|v| ts(v)).collect()
    }

    fn five_am() -> DayStart {
        "05:00".parse().unwrap()
    }

    #[test]
    fn test_no_events_means_no_streak() {
        let summary =
            compute_streak(&[], 1, FrequencyPeriod::Day, DayStart::MIDNIGHT, ts("2025-02-06T12:00:00Z"))
                .unwrap();
        assert_eq!(summary, StreakSummary::default());
    }

    #[test]
    fn test_two_consecutive_days_including_today() {
        let now = ts("2025-02-06T12:00:00Z");
        let events = all(&["2025-02-05T09:00:00Z", "2025-02-06T08:00:00Z"]);

        let summary = compute_streak(&events, 1, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 2, max_streak: 2 });
    }

    #[test]
    fn test_streak_broken_when_today_missing() {
        let now = ts("2025-02-08T12:00:00Z");
        let events = all(&["2025-02-05T09:00:00Z", "2025-02-06T08:00:00Z"]);

        let summary = compute_streak(&events, 1, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 0, max_streak: 2 });
    }

    #[test]
    fn test_day_start_shifts_early_morning_event_to_previous_day() {
        // 2/7 03:00은 05:00 경계 이전 → 2/6로 집계되어 2/6에 두 번 기록한 셈이 됩니다.
        let now = ts("2025-02-07T04:00:00Z");
        let events = all(&["2025-02-06T09:00:00Z", "2025-02-07T03:00:00Z"]);

        let summary = compute_streak(&events, 2, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 1, max_streak: 1 });

        let summary =
            compute_streak(&events, 2, FrequencyPeriod::Day, DayStart::MIDNIGHT, now).unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 0, max_streak: 0 });
    }

    #[test]
    fn test_frequency_count_threshold() {
        let now = ts("2025-02-12T10:00:00Z");
        // 2/3 주: 3회, 2/10 주: 2회
        let events = all(&[
            "2025-02-03T10:00:00Z",
            "2025-02-05T10:00:00Z",
            "2025-02-07T10:00:00Z",
            "2025-02-10T10:00:00Z",
            "2025-02-11T10:00:00Z",
        ]);

        let summary =
            compute_streak(&events, 2, FrequencyPeriod::Week, DayStart::MIDNIGHT, now).unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 2, max_streak: 2 });

        let summary =
            compute_streak(&events, 3, FrequencyPeriod::Week, DayStart::MIDNIGHT, now).unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 0, max_streak: 1 });
    }

    #[test]
    fn test_max_streak_from_older_run() {
        let now = ts("2025-03-10T12:00:00Z");
        let events = all(&[
            // 3일 연속
            "2025-03-01T12:00:00Z",
            "2025-03-02T12:00:00Z",
            "2025-03-03T12:00:00Z",
            // 공백 후 오늘 포함 2일 연속
            "2025-03-09T12:00:00Z",
            "2025-03-10T11:00:00Z",
        ]);

        let summary =
            compute_streak(&events, 1, FrequencyPeriod::Day, DayStart::MIDNIGHT, now).unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 2, max_streak: 3 });
    }

    #[test]
    fn test_monthly_streak_across_year_boundary() {
        let now = ts("2025-02-20T12:00:00Z");
        let events = all(&["2024-12-15T12:00:00Z", "2025-01-03T12:00:00Z", "2025-02-01T12:00:00Z"]);

        let summary =
            compute_streak(&events, 1, FrequencyPeriod::Month, DayStart::MIDNIGHT, now).unwrap();
        assert_eq!(summary, StreakSummary { current_streak: 3, max_streak: 3 });
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let now = ts("2025-02-06T12:00:00Z");
        let events = all(&["2025-02-01T09:00:00Z", "2025-02-05T09:00:00Z", "2025-02-06T08:00:00Z"]);

        let first = compute_streak(&events, 1, FrequencyPeriod::Day, five_am(), now).unwrap();
        let second = compute_streak(&events, 1, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(first, second);

        let mut reversed = events.clone();
        reversed.reverse();
        let third = compute_streak(&reversed, 1, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn test_max_is_never_below_current() {
        let now = ts("2025-02-06T12:00:00Z");
        let histories = [
            all(&["2025-02-06T08:00:00Z"]),
            all(&["2025-02-04T08:00:00Z", "2025-02-05T08:00:00Z", "2025-02-06T08:00:00Z"]),
            all(&["2025-01-01T08:00:00Z", "2025-02-06T08:00:00Z"]),
            all(&["2025-01-01T08:00:00Z", "2025-01-02T08:00:00Z"]),
        ];

        for events in histories {
            for period in [FrequencyPeriod::Day, FrequencyPeriod::Week, FrequencyPeriod::Month] {
                let summary = compute_streak(&events, 1, period, five_am(), now).unwrap();
                assert!(summary.max_streak >= summary.current_streak, "{period}: {summary:?}");
            }
        }
    }

    #[test]
    fn test_adding_event_to_current_period_grows_streak_by_at_most_one() {
        let now = ts("2025-02-06T12:00:00Z");
        let mut events = all(&[
            "2025-02-04T08:00:00Z",
            "2025-02-05T08:00:00Z",
            "2025-02-06T08:00:00Z",
        ]);
        let before = compute_streak(&events, 2, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(before.current_streak, 0);

        events.push(ts("2025-02-06T09:00:00Z"));
        let after = compute_streak(&events, 2, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(after.current_streak, 1);

        events.push(ts("2025-02-06T10:00:00Z"));
        let again = compute_streak(&events, 2, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(again.current_streak, after.current_streak);
    }

    #[test]
    fn test_bucket_representative_is_latest_event() {
        let events = all(&["2025-02-06T08:00:00Z", "2025-02-06T20:00:00Z", "2025-02-06T10:00:00Z"]);
        let buckets = bucket_events(&events, FrequencyPeriod::Day, five_am());

        let tally = buckets.get("2025-02-06").unwrap();
        assert_eq!(tally.count, 3);
        assert_eq!(tally.representative, ts("2025-02-06T20:00:00Z"));
    }

    #[test]
    fn test_group_requires_every_member() {
        let now = ts("2025-02-06T12:00:00Z");
        let alice = all(&["2025-02-05T09:00:00Z", "2025-02-06T09:00:00Z"]);
        // bob은 오늘(2/6)만 기록
        let bob = all(&["2025-02-06T10:00:00Z"]);

        let streak =
            compute_group_streak(&[alice.clone(), bob], 1, FrequencyPeriod::Day, five_am(), now)
                .unwrap();
        assert_eq!(streak, 1);

        let carol = all(&["2025-02-05T11:00:00Z"]);
        let streak =
            compute_group_streak(&[alice, carol], 1, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(streak, 0);
    }

    #[test]
    fn test_group_with_everyone_succeeding() {
        let now = ts("2025-02-12T10:00:00Z");
        let alice = all(&["2025-02-03T10:00:00Z", "2025-02-11T10:00:00Z"]);
        let bob = all(&["2025-02-04T10:00:00Z", "2025-02-10T10:00:00Z"]);

        let streak = compute_group_streak(
            &[alice, bob],
            1,
            FrequencyPeriod::Week,
            DayStart::MIDNIGHT,
            now,
        )
        .unwrap();
        assert_eq!(streak, 2);
    }

    #[test]
    fn test_group_uses_shared_frequency_count() {
        let now = ts("2025-02-06T12:00:00Z");
        let alice = all(&["2025-02-06T08:00:00Z", "2025-02-06T09:00:00Z"]);
        let bob = all(&["2025-02-06T10:00:00Z"]);

        let streak =
            compute_group_streak(&[alice, bob], 2, FrequencyPeriod::Day, five_am(), now).unwrap();
        assert_eq!(streak, 0);
    }

    #[test]
    fn test_group_without_participants() {
        let streak = compute_group_streak(
            &[],
            1,
            FrequencyPeriod::Day,
            DayStart::MIDNIGHT,
            ts("2025-02-06T12:00:00Z"),
        )
        .unwrap();
        assert_eq!(streak, 0);
    }

    #[test]
    fn test_group_member_without_events_blocks_streak() {
        let now = ts("2025-02-06T12:00:00Z");
        let alice = all(&["2025-02-06T08:00:00Z"]);

        let streak =
            compute_group_streak(&[alice, Vec::new()], 1, FrequencyPeriod::Day, five_am(), now)
                .unwrap();
        assert_eq!(streak, 0);
    }
}
