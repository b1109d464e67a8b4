use serde::{Deserialize, Serialize};

/// Progression tiers, ordered by the streak days they cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionPhase {
    Foundation,
    Growth,
    Impact,
    Mastery,
}

impl ProgressionPhase {
    pub const ALL: [ProgressionPhase; 4] = [
        ProgressionPhase::Foundation,
        ProgressionPhase::Growth,
        ProgressionPhase::Impact,
        ProgressionPhase::Mastery,
    ];

    pub fn min_streak_day(self) -> u32 {
        match self {
            ProgressionPhase::Foundation => 1,
            ProgressionPhase::Growth => 8,
            ProgressionPhase::Impact => 31,
            ProgressionPhase::Mastery => 100,
        }
    }

    /// Inclusive upper bound; `None` for the open-ended top tier.
    pub fn max_streak_day(self) -> Option<u32> {
        match self {
            ProgressionPhase::Foundation => Some(7),
            ProgressionPhase::Growth => Some(30),
            ProgressionPhase::Impact => Some(99),
            ProgressionPhase::Mastery => None,
        }
    }

    pub fn next(self) -> Option<ProgressionPhase> {
        match self {
            ProgressionPhase::Foundation => Some(ProgressionPhase::Growth),
            ProgressionPhase::Growth => Some(ProgressionPhase::Impact),
            ProgressionPhase::Impact => Some(ProgressionPhase::Mastery),
            ProgressionPhase::Mastery => None,
        }
    }

    pub fn contains(self, streak_day: u32) -> bool {
        streak_day >= self.min_streak_day()
            && self.max_streak_day().map_or(true, |max| streak_day <= max)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProgressionPhase::Foundation => "foundation",
            ProgressionPhase::Growth => "growth",
            ProgressionPhase::Impact => "impact",
            ProgressionPhase::Mastery => "mastery",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ProgressionPhase::Foundation => "Foundation",
            ProgressionPhase::Growth => "Growth",
            ProgressionPhase::Impact => "Impact",
            ProgressionPhase::Mastery => "Mastery",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ProgressionPhase::Foundation => "Build the daily rhythm of prayer and the Word.",
            ProgressionPhase::Growth => "Deepen the habit with study and gratitude.",
            ProgressionPhase::Impact => "Carry what you have received out to others.",
            ProgressionPhase::Mastery => "Sustain a life of devotion that leads others.",
        }
    }
}

impl std::fmt::Display for ProgressionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a streak day onto its phase. Days below 1 count as foundation.
pub fn resolve_phase(streak_day: u32) -> ProgressionPhase {
    match streak_day {
        0..=7 => ProgressionPhase::Foundation,
        8..=30 => ProgressionPhase::Growth,
        31..=99 => ProgressionPhase::Impact,
        _ => ProgressionPhase::Mastery,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseProgress {
    pub phase: ProgressionPhase,
    pub streak_day: u32,
    /// 1-based position inside the phase.
    pub day_in_phase: u32,
    pub phase_length: Option<u32>,
    pub days_until_next_phase: Option<u32>,
    pub fraction: f64,
}

impl PhaseProgress {
    pub fn for_day(streak_day: u32) -> Self {
        let day = streak_day.max(1);
        let phase = resolve_phase(day);
        let day_in_phase = day - phase.min_streak_day() + 1;
        let phase_length = phase
            .max_streak_day()
            .map(|max| max - phase.min_streak_day() + 1);
        let days_until_next_phase = phase.max_streak_day().map(|max| max + 1 - day);
        let fraction = match phase_length {
            Some(len) => f64::from(day_in_phase) / f64::from(len),
            None => 1.0,
        };
        Self {
            phase,
            streak_day: day,
            day_in_phase,
            phase_length,
            days_until_next_phase,
            fraction,
        }
    }
}
