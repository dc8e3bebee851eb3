//! Audit trail viewer
//!
//! Each load takes a ticket. Only the newest ticket may fill the trail, so a
//! reply for a document the user has already navigated away from is dropped.

use crate::api::SignDevApi;
use crate::error::Result;
use chrono::{DateTime, Datelike, Utc};
use signdev_types::AuditEntry;
use std::fmt;
use tracing::{debug, warn};

pub const LOADING: &str = "Loading audit logs...";

pub const NO_ENTRIES: &str = "No audit entries found for this document.";

/// Claim on the trail issued when a load starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTicket {
    generation: u64,
    document_id: String,
}

impl AuditTicket {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

#[derive(Debug, Default)]
pub struct AuditTrail {
    document_id: Option<String>,
    generation: u64,
    entries: Vec<AuditEntry>,
    loading: bool,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start loading `document_id`, superseding any load in flight
    pub fn begin(&mut self, document_id: &str) -> AuditTicket {
        self.generation += 1;
        if self.document_id.as_deref() != Some(document_id) {
            self.entries.clear();
        }
        self.document_id = Some(document_id.to_string());
        self.loading = true;
        AuditTicket {
            generation: self.generation,
            document_id: document_id.to_string(),
        }
    }

    /// Apply a reply. Returns false when the ticket was superseded.
    pub fn finish(&mut self, ticket: AuditTicket, result: Result<Vec<AuditEntry>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                document_id = %ticket.document_id,
                "Dropping audit reply for a superseded load"
            );
            return false;
        }

        match result {
            Ok(entries) => self.entries = entries,
            Err(e) => {
                warn!(document_id = %ticket.document_id, error = %e, "Failed to fetch audit logs");
                self.entries.clear();
            }
        }
        self.loading = false;
        true
    }

    /// Fetch the trail for `document_id`; an empty id loads nothing
    pub async fn load(&mut self, api: &dyn SignDevApi, document_id: &str) -> bool {
        if document_id.is_empty() {
            return false;
        }
        let ticket = self.begin(document_id);
        let result = api.audit_log(document_id).await;
        self.finish(ticket, result)
    }

    /// Render against the given clock
    pub fn view(&self, now: DateTime<Utc>) -> AuditView {
        if self.loading {
            return AuditView::Loading;
        }
        if self.entries.is_empty() {
            return AuditView::Empty;
        }
        AuditView::Entries(
            self.entries
                .iter()
                .map(|entry| AuditLine::new(entry, now))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuditView {
    Loading,
    Empty,
    Entries(Vec<AuditLine>),
}

impl fmt::Display for AuditView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditView::Loading => f.write_str(LOADING),
            AuditView::Empty => f.write_str(NO_ENTRIES),
            AuditView::Entries(lines) => {
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", line)?;
                }
                Ok(())
            }
        }
    }
}

/// One rendered audit entry
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLine {
    pub icon: &'static str,
    pub action: String,
    pub actor_name: String,
    pub actor_email: String,
    pub relative_time: String,
    pub absolute_time: String,
    pub ip_address: String,
    pub reason: Option<String>,
}

impl AuditLine {
    pub fn new(entry: &AuditEntry, now: DateTime<Utc>) -> Self {
        Self {
            icon: entry.action.icon(),
            action: capitalize(entry.action.as_str()),
            actor_name: entry.actor_name().to_string(),
            actor_email: entry.actor_email().to_string(),
            relative_time: relative_time(entry.timestamp, now),
            absolute_time: absolute_time(entry.timestamp),
            ip_address: entry.source_ip().to_string(),
            reason: entry.rejection_reason().map(str::to_string),
        }
    }
}

impl fmt::Display for AuditLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} by {} ({})",
            self.icon, self.action, self.actor_name, self.actor_email
        )?;
        writeln!(f, "   {} ({})", self.relative_time, self.absolute_time)?;
        write!(f, "   IP: {}", self.ip_address)?;
        if let Some(reason) = &self.reason {
            write!(f, "\n   📝 Rejection Reason: {}", reason)?;
        }
        Ok(())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const MINUTES_IN_DAY: i64 = 1440;
const MINUTES_IN_ALMOST_TWO_DAYS: i64 = 2520;
const MINUTES_IN_MONTH: i64 = 43200;
const MINUTES_IN_TWO_MONTHS: i64 = 86400;

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Human distance between `then` and `now`, e.g. "5 minutes ago" or "in about 2 hours"
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    let future = seconds < 0;
    let seconds = seconds.abs();
    // Half-up rounding to whole minutes
    let minutes = (seconds + 30) / 60;

    let distance = if minutes < 1 {
        "less than a minute".to_string()
    } else if minutes < 45 {
        plural(minutes, "minute")
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < MINUTES_IN_DAY {
        format!("about {}", plural((minutes + 30) / 60, "hour"))
    } else if minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        "1 day".to_string()
    } else if minutes < MINUTES_IN_MONTH {
        plural((minutes + MINUTES_IN_DAY / 2) / MINUTES_IN_DAY, "day")
    } else if minutes < MINUTES_IN_TWO_MONTHS {
        format!(
            "about {}",
            plural((minutes + MINUTES_IN_MONTH / 2) / MINUTES_IN_MONTH, "month")
        )
    } else {
        let months = minutes / MINUTES_IN_MONTH;
        if months < 12 {
            plural((minutes + MINUTES_IN_MONTH / 2) / MINUTES_IN_MONTH, "month")
        } else {
            let years = months / 12;
            match months % 12 {
                0..=2 => format!("about {}", plural(years, "year")),
                3..=8 => format!("over {}", plural(years, "year")),
                _ => format!("almost {}", plural(years + 1, "year")),
            }
        }
    };

    if future {
        format!("in {}", distance)
    } else {
        format!("{} ago", distance)
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// Long date with time, e.g. "March 1st, 2024 at 10:00:00 AM" (UTC)
pub fn absolute_time(at: DateTime<Utc>) -> String {
    format!(
        "{} {}, {} at {}",
        at.format("%B"),
        ordinal(at.day()),
        at.year(),
        at.format("%-I:%M:%S %p")
    )
}
