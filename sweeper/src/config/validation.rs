// File: sweeper/src/config/validation.rs
//! Checks run against configuration values before they are saved, and again
//! at startup so a bad file is reported even when it still loads.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::ScheduleConfig;
use crate::errors::ConfigError;
use crate::scheduler::recurrence::{next_fire_after, parse_cron_spec, previous_fire_before};
use crate::sweep::patterns::ExclusionPatterns;

const FIRE_TIME_FORMAT: &str = "%A, %B %-d, %Y %-I:%M:%S %p %Z";

/// Outcome of one check, ordered from best to worst.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Validation {
    Ok(Option<String>),
    Warning(String),
    Error(String),
}

impl Validation {
    pub fn ok() -> Self {
        Validation::Ok(None)
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Validation::Ok(Some(message.into()))
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Validation::Warning(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Validation::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Validation::Error(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Validation::Warning(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Validation::Ok(message) => message.as_deref(),
            Validation::Warning(message) | Validation::Error(message) => Some(message),
        }
    }

    fn severity(&self) -> u8 {
        match self {
            Validation::Ok(_) => 0,
            Validation::Warning(_) => 1,
            Validation::Error(_) => 2,
        }
    }

    /// Folds several results into one: the worst severity wins and every
    /// message is kept, one per line.
    pub fn aggregate<I>(validations: I) -> Validation
    where
        I: IntoIterator<Item = Validation>,
    {
        let validations: Vec<Validation> = validations.into_iter().collect();
        let worst = validations.iter().map(Validation::severity).max().unwrap_or(0);
        let messages: Vec<&str> = validations.iter().filter_map(Validation::message).collect();
        let joined = messages.join("\n");

        match worst {
            0 if joined.is_empty() => Validation::Ok(None),
            0 => Validation::Ok(Some(joined)),
            1 => Validation::Warning(joined),
            _ => Validation::Error(joined),
        }
    }
}

/// Parses `value` as a cron spec and describes when it would run around `now`.
pub fn validate_cron_spec<Z>(value: &str, now: &DateTime<Z>) -> Validation
where
    Z: TimeZone,
    Z::Offset: std::fmt::Display,
{
    let schedule = match parse_cron_spec(value) {
        Ok(schedule) => schedule,
        Err(e) => {
            if !value.trim().contains('\n') && value.contains("**") {
                return Validation::error(
                    "Invalid input: \"**\" is not a valid field; use \"*\" to match every value",
                );
            }
            return Validation::error(e.to_string());
        }
    };

    let mut validations = Vec::new();

    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.first() == Some(&"*") {
        validations.push(Validation::warning(format!(
            "Spec '{}' runs the sweep every minute; did you mean '0 {}'?",
            value.trim(),
            fields[1..].join(" ")
        )));
    }

    match (
        previous_fire_before(&schedule, now),
        next_fire_after(&schedule, now),
    ) {
        (Some(previous), Some(next)) => validations.push(Validation::ok_with(format!(
            "Would last have run at {}; would next run at {}.",
            previous.format(FIRE_TIME_FORMAT),
            next.format(FIRE_TIME_FORMAT)
        ))),
        _ => validations.push(Validation::warning(
            "This schedule has no fire times so it will never run",
        )),
    }

    Validation::aggregate(validations)
}

/// The age threshold must be a non-negative whole number of days.
pub fn validate_age_threshold(value: &str) -> Validation {
    match value.trim().parse::<u32>() {
        Ok(_) => Validation::ok(),
        Err(e) => Validation::error(
            ConfigError::InvalidAgeThreshold {
                value: value.to_string(),
                reason: e.to_string(),
            }
            .to_string(),
        ),
    }
}

/// Compiles every pattern the way the sweep does and checks that at least one
/// known job would be shielded by them. Any pattern that fails to compile is
/// an error.
pub fn validate_exclude_patterns<S: AsRef<str>>(patterns: &[String], job_names: &[S]) -> Validation {
    let compiled = ExclusionPatterns::compile(patterns);

    if let Some(e) = compiled.invalid().first() {
        return Validation::error(e.to_string());
    }
    if compiled.is_empty() {
        return Validation::ok();
    }

    let matched = job_names
        .iter()
        .filter(|name| compiled.matches(name.as_ref()))
        .count();

    if matched == 0 {
        Validation::warning("No jobs with the above regex")
    } else {
        Validation::ok_with(format!("{} job(s) excluded by the above regex", matched))
    }
}

pub fn validate_timezone(value: &str) -> Validation {
    match value.parse::<Tz>() {
        Ok(_) => Validation::ok(),
        Err(_) => Validation::error(format!(
            "Unknown timezone '{}'; expected an IANA name such as 'Europe/Sofia'",
            value
        )),
    }
}

/// Every check that applies to a complete snapshot. The cron spec is judged in
/// the snapshot's own timezone, or UTC when that one is unknown.
pub fn validate_schedule<S: AsRef<str>>(
    config: &ScheduleConfig,
    job_names: &[S],
    now: DateTime<chrono::Utc>,
) -> Validation {
    let tz = config.tz().unwrap_or(Tz::UTC);
    Validation::aggregate([
        validate_cron_spec(&config.cron_spec, &now.with_timezone(&tz)),
        validate_exclude_patterns(&config.exclude_patterns, job_names),
        validate_timezone(&config.timezone),
    ])
}
