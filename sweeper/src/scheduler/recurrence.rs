// File: sweeper/src/scheduler/recurrence.rs
//! Cron recurrence calculation.
//!
//! Specs are classic 5-field crontab lines (`minute hour day-of-month month
//! day-of-week`). The `cron` crate wants a leading seconds field and numbers
//! weekdays 1-7 from Sunday, so specs are rewritten before parsing: seconds are
//! pinned to 0 and numeric weekdays 0-7 (0 and 7 both Sunday) are remapped.
//! `@hourly`-style shorthands are passed through untouched.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tracing::{debug, error, warn};

use crate::config::ScheduleConfig;
use crate::constants::recurrence::{CRON_FIELDS, DOUBLE_FIRE_WINDOW, FALLBACK_DELAY, SECONDS_FIELD};
use crate::errors::ScheduleError;

/// Source of the delay until the next sweep.
///
/// Implementations must always return a delay: the scheduler has no way to
/// recover from a missing one, so failures map to a fallback instead.
pub trait RecurrencePolicy: Send + Sync + 'static {
    fn next_delay(&self, config: &ScheduleConfig, now: DateTime<Utc>) -> Duration;
}

/// Cron-driven recurrence evaluated in the configured timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct CronRecurrence;

impl RecurrencePolicy for CronRecurrence {
    fn next_delay(&self, config: &ScheduleConfig, now: DateTime<Utc>) -> Duration {
        let tz = match config.tz() {
            Ok(tz) => tz,
            Err(e) => {
                warn!("{}; evaluating cron spec '{}' in UTC", e, config.cron_spec);
                Tz::UTC
            }
        };

        match next_delay(&config.cron_spec, &now.with_timezone(&tz)) {
            Ok(delay) => {
                debug!("Waiting ... {} ms", delay.as_millis());
                delay
            }
            Err(e) => {
                error!(
                    "{}; retrying in {} ms",
                    e,
                    FALLBACK_DELAY.as_millis()
                );
                FALLBACK_DELAY
            }
        }
    }
}

/// Delay from `now` until the first instant strictly after it that matches
/// `spec`, pushed out one extra minute when it falls inside the double-fire
/// window.
pub fn next_delay<Z: TimeZone>(spec: &str, now: &DateTime<Z>) -> Result<Duration, ScheduleError> {
    let schedule = parse_cron_spec(spec)?;
    let next = next_fire_after(&schedule, now).ok_or_else(|| ScheduleError::NoUpcomingFire {
        spec: spec.to_string(),
    })?;

    let raw = next
        .signed_duration_since(now.clone())
        .to_std()
        .map_err(|e| ScheduleError::InvalidCronSpec {
            spec: spec.to_string(),
            reason: format!("next fire lies in the past: {}", e),
        })?;

    Ok(apply_double_fire_floor(raw))
}

/// Adds one minute to delays of a minute or less, so a re-arm right after a
/// fire can never land inside the same cron minute twice.
pub fn apply_double_fire_floor(raw: Duration) -> Duration {
    if raw <= DOUBLE_FIRE_WINDOW {
        raw + DOUBLE_FIRE_WINDOW
    } else {
        raw
    }
}

/// First instant strictly after `now` matching the schedule.
pub fn next_fire_after<Z: TimeZone>(schedule: &Schedule, now: &DateTime<Z>) -> Option<DateTime<Z>> {
    schedule.after(now).next()
}

/// Last instant strictly before `now` matching the schedule.
pub fn previous_fire_before<Z: TimeZone>(
    schedule: &Schedule,
    now: &DateTime<Z>,
) -> Option<DateTime<Z>> {
    schedule.after(now).next_back()
}

pub fn parse_cron_spec(spec: &str) -> Result<Schedule, ScheduleError> {
    let invalid = |reason: String| ScheduleError::InvalidCronSpec {
        spec: spec.to_string(),
        reason,
    };

    let trimmed = spec.trim();
    if trimmed.starts_with('@') {
        return Schedule::from_str(trimmed).map_err(|e| invalid(e.to_string()));
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() != CRON_FIELDS {
        return Err(invalid(format!(
            "expected {} fields, found {}",
            CRON_FIELDS,
            fields.len()
        )));
    }

    for field in &fields {
        check_field_syntax(field).map_err(invalid)?;
    }

    let day_of_week = translate_day_of_week(fields[4]).map_err(invalid)?;
    let six_field = format!(
        "{} {} {} {} {} {}",
        SECONDS_FIELD, fields[0], fields[1], fields[2], fields[3], day_of_week
    );

    Schedule::from_str(&six_field).map_err(|e| invalid(e.to_string()))
}

/// Crontab token grammar for one field: comma separated items, each `*`, `?`,
/// a value or a `low-high` range, optionally followed by `/step`. The `cron`
/// parser is more lenient than this (it takes `**` as `*`).
fn check_field_syntax(field: &str) -> Result<(), String> {
    for item in field.split(',') {
        let (base, step) = match item.split_once('/') {
            Some((base, step)) => (base, Some(step)),
            None => (item, None),
        };

        if let Some(step) = step {
            if step.is_empty() || !step.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("invalid step '{}' in field '{}'", step, field));
            }
        }

        let well_formed = match base {
            "*" | "?" => true,
            _ => base
                .splitn(2, '-')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric())),
        };

        if !well_formed {
            return Err(format!("malformed item '{}' in field '{}'", item, field));
        }
    }

    Ok(())
}

/// Rewrites a crontab day-of-week field (0-7, Sunday = 0 or 7) into the
/// numbering the `cron` crate uses (1-7, Sunday = 1). Numeric items are
/// expanded to explicit lists so ranges ending on 7 and stepped ranges keep
/// their meaning; named days pass through.
fn translate_day_of_week(field: &str) -> Result<String, String> {
    let mut items = Vec::new();

    for item in field.split(',') {
        let (base, step) = match item.split_once('/') {
            Some((base, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid step '{}' in day-of-week", step))?;
                if step == 0 {
                    return Err("day-of-week step must be at least 1".to_string());
                }
                (base, Some(step))
            }
            None => (item, None),
        };

        if base.chars().any(|c| c.is_ascii_alphabetic()) || base == "?" {
            items.push(item.to_string());
            continue;
        }

        let (start, end) = match (base, step) {
            ("*", None) => {
                items.push("*".to_string());
                continue;
            }
            ("*", Some(_)) => (0, 6),
            _ => match base.split_once('-') {
                Some((start, end)) => (parse_weekday(start)?, parse_weekday(end)?),
                None => {
                    let day = parse_weekday(base)?;
                    // `n/step` runs from n to the end of the week
                    if step.is_some() {
                        (day, day.max(6))
                    } else {
                        (day, day)
                    }
                }
            },
        };

        if start > end {
            return Err(format!("day-of-week range {}-{} is reversed", start, end));
        }

        let days: BTreeSet<u32> = (start..=end)
            .step_by(step.unwrap_or(1) as usize)
            .map(|day| day % 7 + 1)
            .collect();

        items.extend(days.iter().map(|day| day.to_string()));
    }

    Ok(items.join(","))
}

fn parse_weekday(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(day) if day <= 7 => Ok(day),
        _ => Err(format!("'{}' is not a valid day of the week (0-7)", value)),
    }
}
