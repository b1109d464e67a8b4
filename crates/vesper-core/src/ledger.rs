use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Calendar;

/// Durable streak counters for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakLedger {
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub total_days_completed: u32,
    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,
}

/// Outcome of recording a completed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreakUpdate {
    /// First completion ever.
    Started,
    /// Completed the day after the last completion.
    Extended,
    /// A gap of more than one day; the streak starts over at 1.
    Reset { previous: u32 },
    /// Same day as the last completion; nothing changed.
    AlreadyCounted,
    /// Completion precedes the last recorded day; nothing changed.
    Backdated,
}

impl StreakUpdate {
    pub fn counted(self) -> bool {
        matches!(
            self,
            StreakUpdate::Started | StreakUpdate::Extended | StreakUpdate::Reset { .. }
        )
    }
}

impl StreakLedger {
    /// Records a fully completed checklist at `completion`.
    pub fn update_streak(
        &mut self,
        completion: DateTime<Utc>,
        calendar: &Calendar,
    ) -> StreakUpdate {
        self.record_day(calendar.start_of_day(completion))
    }

    pub fn record_day(&mut self, today: NaiveDate) -> StreakUpdate {
        let update = match self.last_completed_date {
            None => {
                self.current_streak = 1;
                StreakUpdate::Started
            }
            Some(last) => match Calendar::days_between(last, today) {
                0 => StreakUpdate::AlreadyCounted,
                1 => {
                    self.current_streak = self.current_streak.saturating_add(1);
                    StreakUpdate::Extended
                }
                diff if diff > 1 => {
                    let previous = self.current_streak;
                    self.current_streak = 1;
                    StreakUpdate::Reset { previous }
                }
                _ => StreakUpdate::Backdated,
            },
        };

        if update.counted() {
            self.longest_streak = self.longest_streak.max(self.current_streak);
            self.total_days_completed = self.total_days_completed.saturating_add(1);
            self.last_completed_date = Some(today);
        }
        debug!(
            day = %today,
            ?update,
            current_streak = self.current_streak,
            longest_streak = self.longest_streak,
            total_days_completed = self.total_days_completed,
            "streak update"
        );
        update
    }

    /// Zeroes a streak that went stale. Returns true when the streak changed.
    ///
    /// Never touches `longest_streak` or `total_days_completed`.
    pub fn check_streak_validity(&mut self, now: DateTime<Utc>, calendar: &Calendar) -> bool {
        self.check_validity_on(calendar.start_of_day(now))
    }

    pub fn check_validity_on(&mut self, today: NaiveDate) -> bool {
        let stale = match self.last_completed_date {
            None => true,
            Some(last) => Calendar::days_between(last, today) > 1,
        };
        if !stale || self.current_streak == 0 {
            return false;
        }
        debug!(
            day = %today,
            previous = self.current_streak,
            "streak went stale"
        );
        self.current_streak = 0;
        true
    }

    /// The streak day a checklist is built for; never below 1.
    pub fn streak_day(&self) -> u32 {
        self.current_streak.max(1)
    }
}
