use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{build_core_checklist, newly_unlocked_tasks};
use crate::phase::{resolve_phase, ProgressionPhase};
use crate::task::Task;

/// One calendar day's task list.
///
/// `completed_at` is set when the last task is done and cleared as soon as any
/// task goes back to incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChecklist {
    pub date: NaiveDate,
    pub streak_day: u32,
    pub phase: ProgressionPhase,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub newly_unlocked: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMutation {
    Applied,
    Unchanged,
    UnknownTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistProgress {
    pub completed: usize,
    pub total: usize,
}

impl ChecklistProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }
}

impl DailyChecklist {
    /// Fresh checklist for `date`. Tasks unlocked since `previous_streak_day` are flagged.
    pub fn build(date: NaiveDate, streak_day: u32, previous_streak_day: u32) -> Self {
        let streak_day = streak_day.max(1);
        Self {
            date,
            streak_day,
            phase: resolve_phase(streak_day),
            tasks: build_core_checklist(streak_day),
            completed_at: None,
            newly_unlocked: unlocked_ids(streak_day, previous_streak_day),
        }
    }

    /// Rebuilds the task list for a new streak day within the same calendar day.
    ///
    /// Tasks present in both lists keep their completion state. Rebuilding for
    /// the same streak day keeps the day's NEW markers.
    pub fn rebuild_carrying_forward(&mut self, streak_day: u32) {
        let streak_day = streak_day.max(1);
        let previous: HashMap<String, Task> = self
            .tasks
            .drain(..)
            .map(|task| (task.id.clone(), task))
            .collect();
        let mut tasks = build_core_checklist(streak_day);
        for task in &mut tasks {
            if let Some(old) = previous.get(&task.id) {
                task.is_completed = old.is_completed;
                task.completed_at = old.completed_at;
            }
        }
        if streak_day != self.streak_day {
            self.newly_unlocked = unlocked_ids(streak_day, self.streak_day);
        }
        self.tasks = tasks;
        self.streak_day = streak_day;
        self.phase = resolve_phase(streak_day);
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn complete(&mut self, id: &str, at: DateTime<Utc>) -> TaskMutation {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return TaskMutation::UnknownTask;
        };
        if task.is_completed {
            return TaskMutation::Unchanged;
        }
        task.mark_completed(at);
        TaskMutation::Applied
    }

    pub fn uncomplete(&mut self, id: &str) -> TaskMutation {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return TaskMutation::UnknownTask;
        };
        if !task.is_completed {
            return TaskMutation::Unchanged;
        }
        task.mark_incomplete();
        self.completed_at = None;
        TaskMutation::Applied
    }

    pub fn mark_day_completed(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }

    /// True when the list is non-empty and every task is done.
    pub fn is_completed(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|task| task.is_completed)
    }

    pub fn progress(&self) -> ChecklistProgress {
        ChecklistProgress {
            completed: self.tasks.iter().filter(|task| task.is_completed).count(),
            total: self.tasks.len(),
        }
    }

    pub fn is_new(&self, id: &str) -> bool {
        self.newly_unlocked.iter().any(|new_id| new_id == id)
    }
}

fn unlocked_ids(current: u32, previous: u32) -> Vec<String> {
    newly_unlocked_tasks(current, previous)
        .into_iter()
        .map(|task| task.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        date().and_hms_opt(hour, 0, 0).unwrap().and_utc()
    }

    #[test]
    fn build_uses_phase_selection() {
        let list = DailyChecklist::build(date(), 0, 0);
        assert_eq!(list.streak_day, 1);
        assert_eq!(list.phase, ProgressionPhase::Foundation);
        assert_eq!(list.tasks.len(), 4);
        assert!(list.completed_at.is_none());
        assert!(list.tasks.iter().all(|t| !t.is_completed));
    }

    #[test]
    fn complete_and_uncomplete_are_noops_when_state_matches() {
        let mut list = DailyChecklist::build(date(), 1, 1);
        assert_eq!(list.complete("missing", at(8)), TaskMutation::UnknownTask);
        assert_eq!(list.uncomplete("missing"), TaskMutation::UnknownTask);
        assert_eq!(list.uncomplete("morning-prayer"), TaskMutation::Unchanged);
        assert_eq!(list.complete("morning-prayer", at(8)), TaskMutation::Applied);
        assert_eq!(list.complete("morning-prayer", at(9)), TaskMutation::Unchanged);
        assert_eq!(
            list.task("morning-prayer").and_then(|t| t.completed_at),
            Some(at(8))
        );
        assert_eq!(list.progress(), ChecklistProgress { completed: 1, total: 4 });
    }

    #[test]
    fn uncomplete_clears_day_completion() {
        let mut list = DailyChecklist::build(date(), 1, 1);
        let ids: Vec<String> = list.tasks.iter().map(|t| t.id.clone()).collect();
        for id in &ids {
            list.complete(id, at(8));
        }
        assert!(list.is_completed());
        list.mark_day_completed(at(8));

        assert_eq!(list.uncomplete(&ids[2]), TaskMutation::Applied);
        assert!(!list.is_completed());
        assert!(list.completed_at.is_none());
        let task = list.task(&ids[2]).expect("task");
        assert!(!task.is_completed);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn rebuild_carries_completion_forward_by_id() {
        let mut list = DailyChecklist::build(date(), 7, 7);
        let ids: Vec<String> = list.tasks.iter().map(|t| t.id.clone()).collect();
        for id in &ids {
            list.complete(id, at(7));
        }

        list.rebuild_carrying_forward(8);
        assert_eq!(list.phase, ProgressionPhase::Growth);
        assert_eq!(list.streak_day, 8);
        assert_eq!(list.date, date());
        let state: Vec<(&str, bool)> = list
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.is_completed))
            .collect();
        assert_eq!(
            state,
            vec![
                ("morning-prayer", true),
                ("daily-scripture", true),
                ("verse-memory", false),
                ("prayer-journal", false),
            ]
        );
        assert_eq!(
            list.task("daily-scripture").and_then(|t| t.completed_at),
            Some(at(7))
        );
        assert_eq!(list.newly_unlocked, vec!["verse-memory", "prayer-journal"]);
        assert!(list.is_new("verse-memory"));
        assert!(!list.is_new("morning-prayer"));
    }

    #[test]
    fn rebuild_for_same_streak_day_keeps_new_markers() {
        let mut list = DailyChecklist::build(date(), 7, 7);
        list.rebuild_carrying_forward(8);
        let ids: Vec<String> = list.tasks.iter().map(|t| t.id.clone()).collect();
        for id in &ids {
            list.complete(id, at(9));
        }
        list.mark_day_completed(at(9));

        list.uncomplete("morning-prayer");
        list.complete("morning-prayer", at(10));
        list.rebuild_carrying_forward(8);
        assert_eq!(list.newly_unlocked, vec!["verse-memory", "prayer-journal"]);
        assert!(list.is_completed());
    }

    #[test]
    fn empty_checklist_is_never_complete() {
        let mut list = DailyChecklist::build(date(), 1, 1);
        list.tasks.clear();
        assert!(!list.is_completed());
        assert_eq!(list.progress().fraction(), 0.0);
    }
}
