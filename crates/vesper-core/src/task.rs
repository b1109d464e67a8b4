use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::ProgressionPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Prayer,
    Scripture,
    Gratitude,
    Reflection,
    Worship,
    Service,
    Fasting,
    Community,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Action,
    Reading,
    Journaling,
    Listening,
    Declaration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Static description of a daily task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub category: TaskCategory,
    pub task_type: TaskType,
    pub difficulty: Difficulty,
    pub phase: ProgressionPhase,
    pub minimum_streak_day: u32,
    pub estimated_minutes: u32,
}

impl TaskDefinition {
    pub fn is_unlocked_at(&self, streak_day: u32) -> bool {
        self.minimum_streak_day <= streak_day
    }
}

/// A task as it appears on a day's checklist: definition plus completion overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub category: TaskCategory,
    pub task_type: TaskType,
    pub difficulty: Difficulty,
    pub phase: ProgressionPhase,
    pub minimum_streak_day: u32,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(at);
    }

    pub fn mark_incomplete(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
    }
}

impl From<&TaskDefinition> for Task {
    fn from(def: &TaskDefinition) -> Self {
        Self {
            id: def.id.to_string(),
            title: def.title.to_string(),
            category: def.category,
            task_type: def.task_type,
            difficulty: def.difficulty,
            phase: def.phase,
            minimum_streak_day: def.minimum_streak_day,
            estimated_minutes: def.estimated_minutes,
            is_completed: false,
            completed_at: None,
        }
    }
}
