use std::fmt::Write as _;

use anyhow::Result;
use serde_json::{json, Value};

use vesper_core::catalog::{available_tasks, newly_unlocked_tasks};
use vesper_core::checklist::DailyChecklist;
use vesper_core::ledger::StreakUpdate;
use vesper_core::phase::PhaseProgress;
use vesper_core::EngineEvent;

use crate::Engine;

pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit(&self, payload: Value, text: &str) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&payload)?);
        } else {
            print!("{text}");
        }
        Ok(())
    }
}

pub fn status(engine: &mut Engine, out: &Output) -> Result<()> {
    let events = engine.take_startup_events();
    let ledger = engine.ledger();
    let checklist = engine.checklist();
    let progress = checklist.progress();
    let phase = engine.phase_progress();

    let mut text = String::new();
    write_events(&mut text, &events)?;
    writeln!(
        text,
        "Streak: {} (longest {}, total days {})",
        ledger.current_streak, ledger.longest_streak, ledger.total_days_completed
    )?;
    write_phase(&mut text, &phase)?;
    writeln!(
        text,
        "Today ({}): {}/{} done{}",
        checklist.date,
        progress.completed,
        progress.total,
        if checklist.completed_at.is_some() {
            ", day complete"
        } else {
            ""
        }
    )?;

    out.emit(
        json!({
            "ok": true,
            "date": checklist.date,
            "ledger": ledger,
            "phase": phase,
            "today": {
                "completed": progress.completed,
                "total": progress.total,
                "day_completed": checklist.completed_at.is_some(),
            },
            "events": events,
        }),
        &text,
    )
}

pub fn today(engine: &mut Engine, out: &Output) -> Result<()> {
    let events = engine.take_startup_events();
    let checklist = engine.checklist();
    let mut text = String::new();
    write_events(&mut text, &events)?;
    write_checklist(&mut text, checklist)?;
    out.emit(
        json!({ "ok": true, "checklist": checklist, "events": events }),
        &text,
    )
}

pub fn complete(engine: &mut Engine, id: &str, out: &Output) -> Result<()> {
    let mut events = engine.take_startup_events();
    events.extend(engine.complete_task(id));
    mutation_result(engine, id, events, out)
}

pub fn uncomplete(engine: &mut Engine, id: &str, out: &Output) -> Result<()> {
    let mut events = engine.take_startup_events();
    events.extend(engine.uncomplete_task(id));
    mutation_result(engine, id, events, out)
}

fn mutation_result(
    engine: &Engine,
    id: &str,
    events: Vec<EngineEvent>,
    out: &Output,
) -> Result<()> {
    let changed = events.iter().any(|event| {
        matches!(
            event,
            EngineEvent::TaskCompleted { id: done } | EngineEvent::TaskUncompleted { id: done }
                if done == id
        )
    });
    let progress = engine.checklist().progress();

    let mut text = String::new();
    write_events(&mut text, &events)?;
    if !changed {
        writeln!(text, "No change for {id}")?;
    }
    writeln!(text, "Today: {}/{} done", progress.completed, progress.total)?;

    out.emit(
        json!({
            "ok": true,
            "changed": changed,
            "events": events,
            "ledger": engine.ledger(),
            "progress": progress,
        }),
        &text,
    )
}

pub fn resume(engine: &mut Engine, out: &Output) -> Result<()> {
    let mut events = engine.take_startup_events();
    events.extend(engine.on_app_resume());

    let mut text = String::new();
    write_events(&mut text, &events)?;
    if events.is_empty() {
        writeln!(text, "Up to date")?;
    }
    out.emit(
        json!({ "ok": true, "events": events, "ledger": engine.ledger() }),
        &text,
    )
}

pub fn badges(engine: &mut Engine, out: &Output) -> Result<()> {
    let events = engine.take_startup_events();
    let badges = engine.badges();
    let mut text = String::new();
    write_events(&mut text, &events)?;
    for badge in &badges {
        let mark = if badge.is_unlocked() { "x" } else { " " };
        writeln!(
            text,
            "[{mark}] {} ({:?}) - {}",
            badge.title, badge.rarity, badge.description
        )?;
    }
    let unlocked = badges.iter().filter(|badge| badge.is_unlocked()).count();
    out.emit(
        json!({ "ok": true, "unlocked": unlocked, "badges": badges, "events": events }),
        &text,
    )
}

pub fn tasks(day: u32, events: &[EngineEvent], out: &Output) -> Result<()> {
    let fresh: Vec<String> = newly_unlocked_tasks(day, day.saturating_sub(1))
        .into_iter()
        .map(|task| task.id)
        .collect();
    let tasks = available_tasks(day);

    let mut text = String::new();
    write_events(&mut text, events)?;
    writeln!(text, "Tasks available on streak day {day}:")?;
    let mut entries = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let is_new = fresh.contains(&task.id);
        writeln!(
            text,
            "  {:<22} {:<10} {}{}",
            task.id,
            task.phase.as_str(),
            task.title,
            if is_new { "  NEW" } else { "" }
        )?;
        entries.push(json!({ "task": task, "new": is_new }));
    }
    out.emit(
        json!({ "ok": true, "day": day, "tasks": entries, "events": events }),
        &text,
    )
}

pub fn phase(day: u32, events: &[EngineEvent], out: &Output) -> Result<()> {
    let progress = PhaseProgress::for_day(day);
    let mut text = String::new();
    write_events(&mut text, events)?;
    write_phase(&mut text, &progress)?;
    writeln!(text, "{}", progress.phase.description())?;
    out.emit(
        json!({ "ok": true, "phase": progress, "events": events }),
        &text,
    )
}

fn write_phase(text: &mut String, phase: &PhaseProgress) -> std::fmt::Result {
    match (phase.phase_length, phase.phase.next(), phase.days_until_next_phase) {
        (Some(len), Some(next), Some(left)) => writeln!(
            text,
            "Phase: {} (day {} of {}, {} to {})",
            phase.phase.title(),
            phase.day_in_phase,
            len,
            left,
            next.title()
        ),
        _ => writeln!(
            text,
            "Phase: {} (day {})",
            phase.phase.title(),
            phase.day_in_phase
        ),
    }
}

fn write_checklist(text: &mut String, checklist: &DailyChecklist) -> std::fmt::Result {
    writeln!(
        text,
        "{} - {} (streak day {})",
        checklist.date,
        checklist.phase.title(),
        checklist.streak_day
    )?;
    for task in &checklist.tasks {
        let mark = if task.is_completed { "x" } else { " " };
        let new = if checklist.is_new(&task.id) { "  NEW" } else { "" };
        writeln!(
            text,
            "[{mark}] {:<22} {} ({} min){new}",
            task.id, task.title, task.estimated_minutes
        )?;
    }
    Ok(())
}

fn write_events(text: &mut String, events: &[EngineEvent]) -> std::fmt::Result {
    for event in events {
        match event {
            EngineEvent::TaskCompleted { id } => writeln!(text, "Completed {id}")?,
            EngineEvent::TaskUncompleted { id } => writeln!(text, "Reopened {id}")?,
            EngineEvent::DayCompleted {
                update: StreakUpdate::AlreadyCounted,
                ..
            } => writeln!(text, "Day complete (already counted today)")?,
            EngineEvent::DayCompleted { streak, .. } => {
                writeln!(text, "Day complete! Streak is now {streak}")?
            }
            EngineEvent::PhaseAdvanced { to, .. } => {
                writeln!(text, "Entered the {} phase", to.title())?
            }
            EngineEvent::TasksUnlocked { ids } => {
                writeln!(text, "New tasks unlocked: {}", ids.join(", "))?
            }
            EngineEvent::BadgeUnlocked { badge } => {
                writeln!(text, "Badge unlocked: {}", badge.title)?
            }
            EngineEvent::StreakLost { previous } => {
                writeln!(text, "Streak of {previous} ended")?
            }
            EngineEvent::NewDay { date } => writeln!(text, "New day: {date}")?,
        }
    }
    Ok(())
}
