//! Streak and progression engine for Vesper.

pub mod badge;
pub mod catalog;
pub mod checklist;
pub mod clock;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod persistence;
pub mod phase;
pub mod store;
pub mod task;

pub use engine::{EngineEvent, ProgressEngine};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::version;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
