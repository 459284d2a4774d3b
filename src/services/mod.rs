pub mod ranking;
pub mod scheduler;
pub mod signals;
pub mod sqlite_store;

pub use ranking::{RankingCache, RankingSnapshot};
pub use scheduler::{CycleReport, RefreshScheduler, SchedulerSettings};
pub use signals::{SignalCalculator, SignalRepository};
pub use sqlite_store::SqliteStore;
