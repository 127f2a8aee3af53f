//! Cron-based scheduling of the maintenance sweep
//!
//! This module provides:
//! - `recurrence` - cron spec parsing and next-delay calculation
//! - `timer` - one-shot timer facility on top of `tokio-cron-scheduler`
//! - `recurring` - the self re-arming sweep scheduler
//!
//! # Features
//!
//! - **5-field cron specs**: `minute hour day-of-month month day-of-week`
//! - **Timezone-aware**: specs are evaluated in the configured IANA zone
//! - **Single flight**: one armed callback and one running sweep at a time
//! - **Self-healing**: an unusable spec falls back to a 6 minute retry
//!
//! # Configuration
//!
//! ```toml
//! [schedule]
//! enabled = true
//! cron_spec = "0 2 * * *"  # Daily at 2 AM
//! timezone = "Europe/Sofia"
//! ```

pub mod recurrence;
pub mod recurring;
pub mod timer;

pub use recurrence::{CronRecurrence, RecurrencePolicy};
pub use recurring::{RecurringScheduler, SchedulerState};
pub use timer::{JobSchedulerTimer, TaskHandle, TimerCallback, TimerFacility};
