use chrono::{DateTime, Utc};
use std::fmt;

/// Serialized form of [`WorkerFilter::Any`].
pub const ANY_WORKER: &str = "*any";

/// One logged block of work against a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: i64,
    pub ticket: i64,
    pub worker: String,
    pub submitter: String,
    pub time_started: DateTime<Utc>,
    pub time_submitted: DateTime<Utc>,
    pub seconds_worked: i64,
    pub comments: String,
}

/// A time entry about to be inserted.
#[derive(Debug, Clone)]
pub struct NewTimeEntry {
    pub ticket: i64,
    pub worker: String,
    pub submitter: String,
    pub time_started: DateTime<Utc>,
    pub seconds_worked: i64,
    pub comments: String,
}

impl NewTimeEntry {
    pub fn new(ticket: i64, worker: &str, seconds_worked: i64) -> Self {
        NewTimeEntry {
            ticket,
            worker: worker.to_string(),
            submitter: worker.to_string(),
            time_started: Utc::now(),
            seconds_worked,
            comments: String::new(),
        }
    }

    pub fn submitter(mut self, submitter: Option<&str>) -> Self {
        if let Some(submitter) = submitter {
            self.submitter = submitter.to_string();
        }
        self
    }

    pub fn started(mut self, started: Option<DateTime<Utc>>) -> Self {
        if let Some(started) = started {
            self.time_started = started;
        }
        self
    }

    pub fn comments(mut self, comments: Option<&str>) -> Self {
        self.comments = comments.unwrap_or_default().trim().to_string();
        self
    }
}

/// Which tickets a fetch is restricted to.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketSelector {
    One(i64),
    Many(Vec<i64>),
    /// No ticket constraint, used by the per-worker views.
    All,
}

impl TicketSelector {
    pub fn is_empty(&self) -> bool {
        matches!(self, TicketSelector::Many(ids) if ids.is_empty())
    }
}

impl From<i64> for TicketSelector {
    fn from(id: i64) -> Self {
        TicketSelector::One(id)
    }
}

impl From<Vec<i64>> for TicketSelector {
    fn from(ids: Vec<i64>) -> Self {
        TicketSelector::Many(ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkerFilter {
    #[default]
    Any,
    Worker(String),
}

impl WorkerFilter {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | ANY_WORKER => WorkerFilter::Any,
            worker => WorkerFilter::Worker(worker.to_string()),
        }
    }

    pub fn worker(&self) -> Option<&str> {
        match self {
            WorkerFilter::Any => None,
            WorkerFilter::Worker(name) => Some(name),
        }
    }
}

impl fmt::Display for WorkerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.worker().unwrap_or(ANY_WORKER))
    }
}

/// Constraints of a time-entry fetch.
///
/// `from` is inclusive and `to` exclusive on `time_started`.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    pub tickets: TicketSelector,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub worker: WorkerFilter,
}

impl EntryFilter {
    pub fn new<T: Into<TicketSelector>>(tickets: T) -> Self {
        EntryFilter {
            tickets: tickets.into(),
            from: None,
            to: None,
            worker: WorkerFilter::Any,
        }
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn worker(mut self, worker: WorkerFilter) -> Self {
        self.worker = worker;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_filter_sentinel() {
        assert_eq!(WorkerFilter::parse("*any"), WorkerFilter::Any);
        assert_eq!(WorkerFilter::parse(""), WorkerFilter::Any);
        assert_eq!(WorkerFilter::parse("joe").to_string(), "joe");
        assert_eq!(WorkerFilter::Any.to_string(), ANY_WORKER);
    }

    #[test]
    fn new_entry_defaults_submitter_to_worker() {
        let entry = NewTimeEntry::new(3, "joe", 60).submitter(None).comments(Some("  fixed it \n"));
        assert_eq!(entry.submitter, "joe");
        assert_eq!(entry.comments, "fixed it");
    }
}
