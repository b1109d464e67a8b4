//! Orchestrates checklist, ledger, badges and persistence for one session.
//!
//! All calls are synchronous. Each mutating call persists before returning and
//! hands back the events it produced; the same events go to every subscriber.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::badge::{
    badge_overview, check_for_new_badges, Badge, BadgeDefinition, BadgeSet, BADGE_CATALOG,
};
use crate::checklist::{DailyChecklist, TaskMutation};
use crate::clock::{Calendar, Clock};
use crate::ledger::{StreakLedger, StreakUpdate};
use crate::persistence::{PersistenceGateway, SaveReport, LEDGER_KEY};
use crate::phase::{PhaseProgress, ProgressionPhase};
use crate::store::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    TaskCompleted {
        id: String,
    },
    TaskUncompleted {
        id: String,
    },
    /// Every task on today's list is done and the streak was recorded.
    DayCompleted {
        streak: u32,
        phase: ProgressionPhase,
        update: StreakUpdate,
    },
    PhaseAdvanced {
        from: ProgressionPhase,
        to: ProgressionPhase,
    },
    TasksUnlocked {
        ids: Vec<String>,
    },
    BadgeUnlocked {
        badge: Badge,
    },
    StreakLost {
        previous: u32,
    },
    NewDay {
        date: NaiveDate,
    },
}

type Subscriber = Box<dyn FnMut(&EngineEvent)>;

pub struct ProgressEngine<S, C> {
    gateway: PersistenceGateway<S>,
    clock: C,
    calendar: Calendar,
    badge_catalog: &'static [BadgeDefinition],
    ledger: StreakLedger,
    checklist: DailyChecklist,
    badges: BadgeSet,
    subscribers: Vec<Subscriber>,
    startup_events: Vec<EngineEvent>,
}

impl<S: KeyValueStore, C: Clock> ProgressEngine<S, C> {
    /// Loads stored state and reconciles it against today before anything reads it.
    pub fn open(store: S, clock: C, calendar: Calendar) -> Self {
        Self::open_with_badges(store, clock, calendar, BADGE_CATALOG)
    }

    pub fn open_with_badges(
        store: S,
        clock: C,
        calendar: Calendar,
        badge_catalog: &'static [BadgeDefinition],
    ) -> Self {
        let gateway = PersistenceGateway::new(store);
        let snapshot = gateway.load();
        let now = clock.now();
        let today = calendar.start_of_day(now);

        let stored_checklist = snapshot.checklist.clone();
        let ledger_readable = !snapshot.was_discarded(LEDGER_KEY);
        let loaded_ledger = snapshot.ledger.clone();
        let loaded_badges = snapshot.badges.clone();
        let checklist = snapshot
            .checklist
            .unwrap_or_else(|| DailyChecklist::build(today, 1, 1));

        let mut engine = Self {
            gateway,
            clock,
            calendar,
            badge_catalog,
            ledger: snapshot.ledger,
            checklist,
            badges: snapshot.badges,
            subscribers: Vec::new(),
            startup_events: Vec::new(),
        };

        if ledger_readable {
            engine.recover_unrecorded_completion();
        } else if engine.checklist.completed_at.is_some() {
            warn!("stored ledger unreadable; not rebuilding it from the checklist");
        }
        let mut events = engine.reconcile_day(now, true);
        if stored_checklist.is_none() {
            // Built only now so it reflects the validated streak.
            let day = engine.ledger.streak_day();
            engine.checklist = DailyChecklist::build(today, day, day);
            events.push(EngineEvent::NewDay { date: today });
        }
        events.extend(engine.evaluate_badges(now));

        let changed = !snapshot.discarded.is_empty()
            || engine.ledger != loaded_ledger
            || engine.badges != loaded_badges
            || stored_checklist.as_ref() != Some(&engine.checklist);
        if changed {
            engine.save();
        }
        debug!(
            day = %today,
            current_streak = engine.ledger.current_streak,
            events = events.len(),
            changed,
            "engine opened"
        );
        engine.startup_events = events;
        engine
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&EngineEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Events produced while opening, before any subscriber could attach.
    pub fn take_startup_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.startup_events)
    }

    pub fn complete_task(&mut self, id: &str) -> Vec<EngineEvent> {
        let now = self.clock.now();
        let mut events = self.reconcile_day(now, false);

        match self.checklist.complete(id, now) {
            TaskMutation::Applied => {
                events.push(EngineEvent::TaskCompleted { id: id.to_string() });
                if self.checklist.is_completed() && self.checklist.completed_at.is_none() {
                    events.extend(self.complete_day(now));
                }
            }
            TaskMutation::UnknownTask => debug!(task = id, "ignoring unknown task"),
            TaskMutation::Unchanged => {}
        }
        self.finish(events)
    }

    /// Clears a task. A streak already recorded for today is kept.
    pub fn uncomplete_task(&mut self, id: &str) -> Vec<EngineEvent> {
        let now = self.clock.now();
        let mut events = self.reconcile_day(now, false);

        match self.checklist.uncomplete(id) {
            TaskMutation::Applied => {
                events.push(EngineEvent::TaskUncompleted { id: id.to_string() });
            }
            TaskMutation::UnknownTask => debug!(task = id, "ignoring unknown task"),
            TaskMutation::Unchanged => {}
        }
        self.finish(events)
    }

    /// Staleness and day-rollover checks for a foreground activation.
    pub fn on_app_resume(&mut self) -> Vec<EngineEvent> {
        let now = self.clock.now();
        let events = self.reconcile_day(now, false);
        self.finish(events)
    }

    pub fn save(&mut self) -> SaveReport {
        self.gateway.save(&self.ledger, &self.checklist, &self.badges)
    }

    pub fn ledger(&self) -> &StreakLedger {
        &self.ledger
    }

    pub fn checklist(&self) -> &DailyChecklist {
        &self.checklist
    }

    pub fn unlocked_badges(&self) -> &BadgeSet {
        &self.badges
    }

    pub fn badges(&self) -> Vec<Badge> {
        badge_overview(self.badge_catalog, &self.badges)
    }

    pub fn phase_progress(&self) -> PhaseProgress {
        PhaseProgress::for_day(self.ledger.current_streak)
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.start_of_day(self.clock.now())
    }

    pub fn into_store(self) -> S {
        self.gateway.into_store()
    }

    fn complete_day(&mut self, now: DateTime<Utc>) -> Vec<EngineEvent> {
        let from = self.checklist.phase;
        let update = self.ledger.update_streak(now, &self.calendar);
        self.checklist.rebuild_carrying_forward(self.ledger.streak_day());
        self.checklist.mark_day_completed(now);

        let to = self.checklist.phase;
        info!(
            streak = self.ledger.current_streak,
            phase = %to,
            ?update,
            "day completed"
        );
        let mut events = vec![EngineEvent::DayCompleted {
            streak: self.ledger.current_streak,
            phase: to,
            update,
        }];
        if to != from {
            events.push(EngineEvent::PhaseAdvanced { from, to });
        }
        if !self.checklist.newly_unlocked.is_empty() {
            events.push(EngineEvent::TasksUnlocked {
                ids: self.checklist.newly_unlocked.clone(),
            });
        }
        events.extend(self.evaluate_badges(now));
        events
    }

    fn evaluate_badges(&mut self, now: DateTime<Utc>) -> Vec<EngineEvent> {
        check_for_new_badges(self.badge_catalog, &self.ledger, &mut self.badges, now)
            .into_iter()
            .map(|badge| EngineEvent::BadgeUnlocked { badge })
            .collect()
    }

    /// Zeroes a stale streak and swaps in a fresh checklist when the day changed.
    ///
    /// With `always_validate` the staleness check runs even on the same day.
    fn reconcile_day(&mut self, now: DateTime<Utc>, always_validate: bool) -> Vec<EngineEvent> {
        let today = self.calendar.start_of_day(now);
        let new_day = self.checklist.date != today;
        let mut events = Vec::new();
        if !new_day && !always_validate {
            return events;
        }

        let previous = self.ledger.current_streak;
        if self.ledger.check_streak_validity(now, &self.calendar) {
            events.push(EngineEvent::StreakLost { previous });
        }
        if new_day {
            let streak_day = self.ledger.streak_day();
            self.checklist = DailyChecklist::build(today, streak_day, self.checklist.streak_day);
            debug!(day = %today, streak_day, "fresh checklist for new day");
            events.push(EngineEvent::NewDay { date: today });
        }
        events
    }

    /// Ledger and checklist are written separately. If the checklist says a day
    /// was finished but the ledger never recorded it, record it now.
    fn recover_unrecorded_completion(&mut self) {
        let Some(completed_at) = self.checklist.completed_at else {
            return;
        };
        let update = self.ledger.update_streak(completed_at, &self.calendar);
        if update.counted() {
            warn!(
                day = %self.calendar.start_of_day(completed_at),
                ?update,
                "recorded a day completion missing from the stored ledger"
            );
        }
    }

    fn finish(&mut self, events: Vec<EngineEvent>) -> Vec<EngineEvent> {
        if events.is_empty() {
            return events;
        }
        self.save();
        for subscriber in &mut self.subscribers {
            for event in &events {
                subscriber(event);
            }
        }
        events
    }
}
