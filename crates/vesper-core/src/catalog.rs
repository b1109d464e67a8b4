//! Built-in task catalog and the per-phase checklist selection policy.

use std::collections::HashSet;

use crate::phase::{resolve_phase, ProgressionPhase};
use crate::task::{Difficulty, Task, TaskCategory, TaskDefinition, TaskType};

use crate::phase::ProgressionPhase::{Foundation, Growth, Impact, Mastery};
use crate::task::Difficulty::{Easy, Hard, Medium};

#[allow(clippy::too_many_arguments)]
const fn def(
    id: &'static str,
    title: &'static str,
    category: TaskCategory,
    task_type: TaskType,
    difficulty: Difficulty,
    phase: ProgressionPhase,
    minimum_streak_day: u32,
    estimated_minutes: u32,
) -> TaskDefinition {
    TaskDefinition {
        id,
        title,
        category,
        task_type,
        difficulty,
        phase,
        minimum_streak_day,
        estimated_minutes,
    }
}

/// Catalog order matters: checklist selection always takes the earliest entries.
#[rustfmt::skip]
pub static TASK_CATALOG: &[TaskDefinition] = &[
    def("morning-prayer", "Start the day with five minutes of prayer", TaskCategory::Prayer, TaskType::Action, Easy, Foundation, 1, 5),
    def("daily-scripture", "Read today's scripture passage", TaskCategory::Scripture, TaskType::Reading, Easy, Foundation, 1, 5),
    def("gratitude-three", "Write down three things you are grateful for", TaskCategory::Gratitude, TaskType::Journaling, Easy, Foundation, 1, 3),
    def("speak-declaration", "Speak today's declaration out loud", TaskCategory::Reflection, TaskType::Declaration, Easy, Foundation, 1, 2),
    def("worship-song", "Listen to a worship song without distraction", TaskCategory::Worship, TaskType::Listening, Easy, Foundation, 3, 5),
    def("evening-examen", "Review the day before you sleep", TaskCategory::Reflection, TaskType::Journaling, Medium, Foundation, 5, 10),
    def("verse-memory", "Memorize this week's verse", TaskCategory::Scripture, TaskType::Action, Medium, Growth, 8, 10),
    def("prayer-journal", "Journal a written prayer", TaskCategory::Prayer, TaskType::Journaling, Medium, Growth, 8, 10),
    def("chapter-study", "Study a full chapter with notes", TaskCategory::Scripture, TaskType::Reading, Medium, Growth, 15, 20),
    def("skip-a-meal", "Fast one meal and pray through it", TaskCategory::Fasting, TaskType::Action, Hard, Growth, 22, 30),
    def("encourage-someone", "Send an encouraging message to someone", TaskCategory::Community, TaskType::Action, Medium, Impact, 31, 5),
    def("intercede-for-three", "Pray by name for three people", TaskCategory::Prayer, TaskType::Action, Medium, Impact, 31, 10),
    def("serve-neighbor", "Do one unasked act of service", TaskCategory::Service, TaskType::Action, Hard, Impact, 45, 30),
    def("share-testimony", "Share what God has done this week", TaskCategory::Community, TaskType::Declaration, Hard, Impact, 60, 15),
    def("mentor-check-in", "Check in with someone you are discipling", TaskCategory::Community, TaskType::Action, Hard, Mastery, 100, 20),
    def("lead-devotional", "Lead a short devotional for others", TaskCategory::Service, TaskType::Declaration, Hard, Mastery, 150, 30),
];

pub fn find_task(id: &str) -> Option<&'static TaskDefinition> {
    TASK_CATALOG.iter().find(|def| def.id == id)
}

/// Every catalog task unlocked at `streak_day`, in catalog order.
pub fn available_tasks(streak_day: u32) -> Vec<Task> {
    available_definitions(streak_day).map(Task::from).collect()
}

fn available_definitions(streak_day: u32) -> impl Iterator<Item = &'static TaskDefinition> {
    TASK_CATALOG
        .iter()
        .filter(move |def| def.is_unlocked_at(streak_day))
}

fn unlocked_in_phase(streak_day: u32, phase: ProgressionPhase, take: usize) -> Vec<Task> {
    available_definitions(streak_day)
        .filter(|def| def.phase == phase)
        .take(take)
        .map(Task::from)
        .collect()
}

/// A small, phase-dependent mix of tasks for one day.
///
/// The list stays at four or five entries however long the streak runs.
pub fn build_core_checklist(streak_day: u32) -> Vec<Task> {
    let day = streak_day.max(1);
    let mix: &[(ProgressionPhase, usize)] = match resolve_phase(day) {
        Foundation => &[(Foundation, 4)],
        Growth => &[(Foundation, 2), (Growth, 2)],
        Impact => &[(Foundation, 1), (Growth, 1), (Impact, 2)],
        Mastery => &[(Foundation, 1), (Growth, 1), (Impact, 1), (Mastery, 1)],
    };
    mix.iter()
        .flat_map(|(phase, take)| unlocked_in_phase(day, *phase, *take))
        .collect()
}

/// Tasks available at `current_streak_day` that were not available at `previous_streak_day`.
pub fn newly_unlocked_tasks(current_streak_day: u32, previous_streak_day: u32) -> Vec<Task> {
    let before: HashSet<&str> = available_definitions(previous_streak_day)
        .map(|def| def.id)
        .collect();
    available_definitions(current_streak_day)
        .filter(|def| !before.contains(def.id))
        .map(Task::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn catalog_ids_are_unique_and_phase_tags_match_unlock_day() {
        let mut seen = HashSet::new();
        for def in TASK_CATALOG {
            assert!(seen.insert(def.id), "duplicate task id {}", def.id);
            assert!(def.minimum_streak_day >= 1);
            assert!(
                def.phase.contains(def.minimum_streak_day),
                "{} unlocks outside its phase",
                def.id
            );
        }
    }

    #[test]
    fn available_tasks_preserve_catalog_order() {
        let day_one = available_tasks(1);
        assert_eq!(
            ids(&day_one),
            vec!["morning-prayer", "daily-scripture", "gratitude-three", "speak-declaration"]
        );
        let day_five = available_tasks(5);
        assert_eq!(day_five.len(), 6);
        assert_eq!(available_tasks(0).len(), 0);
        assert_eq!(available_tasks(1000).len(), TASK_CATALOG.len());
    }

    #[test]
    fn foundation_checklist_takes_first_four() {
        let list = build_core_checklist(6);
        assert_eq!(
            ids(&list),
            vec!["morning-prayer", "daily-scripture", "gratitude-three", "speak-declaration"]
        );
        assert_eq!(ids(&build_core_checklist(0)), ids(&build_core_checklist(1)));
    }

    #[test]
    fn growth_checklist_keeps_two_anchors() {
        let list = build_core_checklist(8);
        assert_eq!(
            ids(&list),
            vec!["morning-prayer", "daily-scripture", "verse-memory", "prayer-journal"]
        );
    }

    #[test]
    fn later_phases_mix_earliest_unlocked_tasks() {
        assert_eq!(
            ids(&build_core_checklist(31)),
            vec!["morning-prayer", "verse-memory", "encourage-someone", "intercede-for-three"]
        );
        assert_eq!(
            ids(&build_core_checklist(100)),
            vec!["morning-prayer", "verse-memory", "encourage-someone", "mentor-check-in"]
        );
    }

    #[test]
    fn checklist_size_is_bounded() {
        for day in 1..=400 {
            let len = build_core_checklist(day).len();
            assert!((4..=5).contains(&len), "day {day} has {len} tasks");
        }
    }

    #[test]
    fn newly_unlocked_is_a_set_difference() {
        assert_eq!(
            ids(&newly_unlocked_tasks(8, 7)),
            vec!["verse-memory", "prayer-journal"]
        );
        assert!(newly_unlocked_tasks(7, 6).is_empty());
        assert_eq!(ids(&newly_unlocked_tasks(3, 2)), vec!["worship-song"]);
        assert!(newly_unlocked_tasks(2, 9).is_empty());
        assert_eq!(newly_unlocked_tasks(1, 0).len(), 4);
    }

    #[test]
    fn find_task_by_id() {
        assert_eq!(find_task("skip-a-meal").map(|d| d.minimum_streak_day), Some(22));
        assert!(find_task("nope").is_none());
    }
}
