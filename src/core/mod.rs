pub mod scheduler;

pub use scheduler::{CycleOutcome, CycleReport, CycleStats, Scheduler, SchedulerState};
