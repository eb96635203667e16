//! Yoga practice log and streak arithmetic.

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::Serialize;

#[derive(Clone, Debug, Default)]
pub struct PracticeLog {
  days: BTreeSet<NaiveDate>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
  pub current: u32,
  pub longest: u32,
  pub total_days: usize,
  pub practiced_today: bool,
}

impl PracticeLog {
  /// Idempotent: practicing twice on one day counts once.
  pub fn record(&mut self, day: NaiveDate) -> bool {
    self.days.insert(day)
  }

  /// Consecutive days ending today, or ending yesterday when today has not
  /// been practiced yet. Anything older breaks the streak.
  pub fn current_streak(&self, today: NaiveDate) -> u32 {
    let anchor = if self.days.contains(&today) {
      today
    } else {
      match today.checked_sub_days(Days::new(1)) {
        Some(y) if self.days.contains(&y) => y,
        _ => return 0,
      }
    };

    let mut count = 0;
    let mut day = anchor;
    while self.days.contains(&day) {
      count += 1;
      match day.checked_sub_days(Days::new(1)) {
        Some(prev) => day = prev,
        None => break,
      }
    }
    count
  }

  pub fn longest_streak(&self) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in &self.days {
      run = match prev {
        Some(p) if p.succ_opt() == Some(day) => run + 1,
        _ => 1,
      };
      longest = longest.max(run);
      prev = Some(day);
    }
    longest
  }

  pub fn summary(&self, today: NaiveDate) -> StreakSummary {
    StreakSummary {
      current: self.current_streak(today),
      longest: self.longest_streak(),
      total_days: self.days.len(),
      practiced_today: self.days.contains(&today),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  fn log(days: &[&str]) -> PracticeLog {
    let mut l = PracticeLog::default();
    for s in days {
      l.record(d(s));
    }
    l
  }

  #[test]
  fn empty_log_has_no_streak() {
    let l = PracticeLog::default();
    assert_eq!(l.current_streak(d("2024-03-10")), 0);
    assert_eq!(l.longest_streak(), 0);
  }

  #[test]
  fn streak_ending_today() {
    let l = log(&["2024-03-08", "2024-03-09", "2024-03-10"]);
    assert_eq!(l.current_streak(d("2024-03-10")), 3);
  }

  #[test]
  fn streak_survives_until_today_is_practiced() {
    let l = log(&["2024-03-08", "2024-03-09"]);
    assert_eq!(l.current_streak(d("2024-03-10")), 2);
    assert_eq!(l.current_streak(d("2024-03-11")), 0);
  }

  #[test]
  fn streak_crosses_month_boundaries() {
    let l = log(&["2024-02-28", "2024-02-29", "2024-03-01"]);
    assert_eq!(l.current_streak(d("2024-03-01")), 3);
  }

  #[test]
  fn recording_is_idempotent() {
    let mut l = log(&["2024-03-10"]);
    assert!(!l.record(d("2024-03-10")));
    assert_eq!(l.summary(d("2024-03-10")).total_days, 1);
  }

  #[test]
  fn longest_streak_spans_gaps() {
    let l = log(&["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-10", "2024-01-11"]);
    assert_eq!(l.longest_streak(), 3);
    let s = l.summary(d("2024-01-11"));
    assert_eq!(s, StreakSummary { current: 2, longest: 3, total_days: 5, practiced_today: true });
  }
}
