//! Common test data and constants

use chrono::{DateTime, Duration, TimeZone, Utc};
use sweeper::registry::Job;

/// Fixed sweep instant; a Monday
pub fn sweep_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap()
}

pub fn days_before(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// Common test job names
pub mod jobs {
    pub const STALE_1: &str = "job1";
    pub const STALE_2: &str = "job2";
    pub const STALE_11: &str = "job11";
    pub const FRESH: &str = "fresh-job";
    pub const NEVER_BUILT: &str = "never-built";
    pub const ALREADY_DISABLED: &str = "already-disabled";
    pub const BUSY: &str = "busy-job";
}

/// Job that last built `days` days before `now`
pub fn stale_job(name: &str, now: DateTime<Utc>, days: i64) -> Job {
    Job::new(name).with_last_build(days_before(now, days))
}

/// One job per classification, relative to `now` and a 30 day threshold
pub fn mixed_jobs(now: DateTime<Utc>) -> Vec<Job> {
    vec![
        stale_job(jobs::STALE_1, now, 45).with_description("nightly integration"),
        stale_job(jobs::STALE_2, now, 90),
        stale_job(jobs::STALE_11, now, 60),
        stale_job(jobs::FRESH, now, 2),
        Job::new(jobs::NEVER_BUILT),
        stale_job(jobs::ALREADY_DISABLED, now, 100).disabled(),
        stale_job(jobs::BUSY, now, 100).building(),
    ]
}
