use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

use crate::ledger::StreakLedger;

/// What has to be true for a badge to unlock. Equality on this value is badge identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BadgeRequirement {
    FirstDay,
    StreakDays(u32),
    TotalDaysCompleted(u32),
    ConsecutiveWeeks(u32),
    PerfectWeek,
}

impl BadgeRequirement {
    pub fn is_met(&self, stats: &BadgeStats) -> bool {
        match *self {
            BadgeRequirement::FirstDay => stats.total_days_completed >= 1,
            BadgeRequirement::StreakDays(days) => stats.current_streak >= days,
            BadgeRequirement::TotalDaysCompleted(days) => stats.total_days_completed >= days,
            BadgeRequirement::ConsecutiveWeeks(weeks) => stats.consecutive_weeks >= weeks,
            BadgeRequirement::PerfectWeek => stats.has_perfect_week,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub requirement: BadgeRequirement,
    pub rarity: BadgeRarity,
    pub title: &'static str,
    pub description: &'static str,
}

pub static BADGE_CATALOG: &[BadgeDefinition] = &[
    BadgeDefinition {
        requirement: BadgeRequirement::FirstDay,
        rarity: BadgeRarity::Common,
        title: "First Step",
        description: "Completed your first full day.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::StreakDays(3),
        rarity: BadgeRarity::Common,
        title: "Kindled",
        description: "Three days in a row.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::StreakDays(7),
        rarity: BadgeRarity::Rare,
        title: "Sabbath Rest",
        description: "A full week without missing a day.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::PerfectWeek,
        rarity: BadgeRarity::Rare,
        title: "Perfect Week",
        description: "Seven for seven.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::TotalDaysCompleted(10),
        rarity: BadgeRarity::Common,
        title: "Faithful Ten",
        description: "Ten days completed in total.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::ConsecutiveWeeks(2),
        rarity: BadgeRarity::Rare,
        title: "Steady",
        description: "Two unbroken weeks.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::StreakDays(30),
        rarity: BadgeRarity::Epic,
        title: "Rooted",
        description: "Thirty days in a row.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::ConsecutiveWeeks(4),
        rarity: BadgeRarity::Epic,
        title: "Month of Devotion",
        description: "Four unbroken weeks.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::TotalDaysCompleted(50),
        rarity: BadgeRarity::Rare,
        title: "Jubilee",
        description: "Fifty days completed in total.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::StreakDays(100),
        rarity: BadgeRarity::Legendary,
        title: "Centurion",
        description: "One hundred days in a row.",
    },
    BadgeDefinition {
        requirement: BadgeRequirement::TotalDaysCompleted(365),
        rarity: BadgeRarity::Legendary,
        title: "A Year of Days",
        description: "Three hundred sixty-five days completed.",
    },
];

/// A badge definition with its unlock overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub requirement: BadgeRequirement,
    pub rarity: BadgeRarity,
    pub title: String,
    pub description: String,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Badge {
    pub fn from_definition(def: &BadgeDefinition, unlocked_at: Option<DateTime<Utc>>) -> Self {
        Self {
            requirement: def.requirement,
            rarity: def.rarity,
            title: def.title.to_string(),
            description: def.description.to_string(),
            unlocked_at,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedBadge {
    pub id: String,
    pub requirement: BadgeRequirement,
    pub unlocked_at: DateTime<Utc>,
}

/// Durable set of unlocked badges, keyed by requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<UnlockedBadge>", into = "Vec<UnlockedBadge>")]
pub struct BadgeSet {
    entries: Vec<UnlockedBadge>,
}

impl BadgeSet {
    pub fn contains(&self, requirement: &BadgeRequirement) -> bool {
        self.entries.iter().any(|e| &e.requirement == requirement)
    }

    pub fn get(&self, requirement: &BadgeRequirement) -> Option<&UnlockedBadge> {
        self.entries.iter().find(|e| &e.requirement == requirement)
    }

    /// Adds an entry unless the requirement is already present. Returns true when added.
    pub fn insert(&mut self, requirement: BadgeRequirement, at: DateTime<Utc>) -> bool {
        if self.contains(&requirement) {
            return false;
        }
        self.entries.push(UnlockedBadge {
            id: Ulid::new().to_string(),
            requirement,
            unlocked_at: at,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnlockedBadge> {
        self.entries.iter()
    }
}

impl From<Vec<UnlockedBadge>> for BadgeSet {
    fn from(entries: Vec<UnlockedBadge>) -> Self {
        // Older snapshots may hold the same requirement twice; the first unlock wins.
        let mut set = BadgeSet::default();
        for entry in entries {
            if !set.contains(&entry.requirement) {
                set.entries.push(entry);
            }
        }
        set
    }
}

impl From<BadgeSet> for Vec<UnlockedBadge> {
    fn from(set: BadgeSet) -> Self {
        set.entries
    }
}

/// Ledger-derived values the badge predicates read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeStats {
    pub current_streak: u32,
    pub total_days_completed: u32,
    pub consecutive_weeks: u32,
    pub has_perfect_week: bool,
}

impl BadgeStats {
    pub fn from_ledger(ledger: &StreakLedger) -> Self {
        Self {
            current_streak: ledger.current_streak,
            total_days_completed: ledger.total_days_completed,
            consecutive_weeks: ledger.current_streak / 7,
            has_perfect_week: ledger.current_streak >= 7,
        }
    }
}

/// Unlocks every catalog badge whose requirement now holds and is not yet in `unlocked`.
///
/// Returns the newly unlocked badges in catalog order.
pub fn check_for_new_badges(
    catalog: &[BadgeDefinition],
    ledger: &StreakLedger,
    unlocked: &mut BadgeSet,
    now: DateTime<Utc>,
) -> Vec<Badge> {
    let stats = BadgeStats::from_ledger(ledger);
    let mut fresh = Vec::new();
    for def in catalog {
        if unlocked.contains(&def.requirement) || !def.requirement.is_met(&stats) {
            continue;
        }
        if unlocked.insert(def.requirement, now) {
            debug!(badge = def.title, requirement = ?def.requirement, "badge unlocked");
            fresh.push(Badge::from_definition(def, Some(now)));
        }
    }
    fresh
}

/// Every catalog badge with its unlock overlay applied.
pub fn badge_overview(catalog: &[BadgeDefinition], unlocked: &BadgeSet) -> Vec<Badge> {
    catalog
        .iter()
        .map(|def| {
            let at = unlocked.get(&def.requirement).map(|entry| entry.unlocked_at);
            Badge::from_definition(def, at)
        })
        .collect()
}
