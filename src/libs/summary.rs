//! Hours summed per worker, per ticket, per day and per milestone.

use crate::db::tickets::Tickets;
use crate::db::time_entries::TimeEntries;
use crate::libs::entry::{EntryFilter, TicketSelector, WorkerFilter, ANY_WORKER};
use crate::libs::error::Result;
use crate::libs::formatter::{end_of_day, format_date, local_date, start_of_day, ISO_DATE_FORMAT};
use crate::libs::report::{href, HOURS_PATH};
use crate::libs::ticket::Milestone;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::Connection;
use std::collections::{BTreeMap, HashMap};

/// Default range of the per-worker views: the last seven days up to now.
pub fn user_range(from: Option<NaiveDate>, to: Option<NaiveDate>, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = match from {
        Some(date) => start_of_day(date),
        None => start_of_day(local_date(&now)) - Duration::days(7),
    };
    let to = match to {
        Some(date) => end_of_day(date),
        None => now,
    };
    (from, to)
}

pub trait SummaryTotals {
    fn total_seconds(&self) -> i64;
}

impl<K> SummaryTotals for [(K, i64)] {
    fn total_seconds(&self) -> i64 {
        self.iter().map(|(_, seconds)| seconds).sum()
    }
}

/// Seconds per worker over `[from, to)`, sorted by worker.
///
/// With a milestone, only entries on tickets of that milestone count, but
/// every worker with entries in the range is listed.
pub fn hours_by_worker(conn: &Connection, from: DateTime<Utc>, to: DateTime<Utc>, milestone: Option<&str>) -> Result<Vec<(String, i64)>> {
    let entries = TimeEntries::new(conn).fetch(&EntryFilter::new(TicketSelector::All).between(Some(from), Some(to)))?;
    let tickets = Tickets::new(conn);

    let mut milestones: HashMap<i64, String> = HashMap::new();
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for entry in entries {
        let total = totals.entry(entry.worker.clone()).or_insert(0);
        if let Some(milestone) = milestone {
            if !milestones.contains_key(&entry.ticket) {
                let name = tickets.get(entry.ticket)?.map(|t| t.milestone).unwrap_or_default();
                milestones.insert(entry.ticket, name);
            }
            if milestones.get(&entry.ticket).map(String::as_str) != Some(milestone) {
                continue;
            }
        }
        *total += entry.seconds_worked;
    }
    Ok(totals.into_iter().collect())
}

/// Seconds `worker` logged per ticket over `[from, to)`, by ticket id.
pub fn hours_by_ticket(conn: &Connection, worker: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<(i64, i64)>> {
    let mut totals: BTreeMap<i64, i64> = BTreeMap::new();
    for entry in fetch_for_worker(conn, worker, from, to)? {
        *totals.entry(entry.0).or_insert(0) += entry.2;
    }
    Ok(totals.into_iter().collect())
}

/// Seconds `worker` logged per local day over `[from, to)`.
pub fn hours_by_date(conn: &Connection, worker: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<(NaiveDate, i64)>> {
    let mut totals: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for entry in fetch_for_worker(conn, worker, from, to)? {
        *totals.entry(entry.1).or_insert(0) += entry.2;
    }
    Ok(totals.into_iter().collect())
}

fn fetch_for_worker(conn: &Connection, worker: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<(i64, NaiveDate, i64)>> {
    let filter = EntryFilter::new(TicketSelector::All)
        .between(Some(from), Some(to))
        .worker(WorkerFilter::Worker(worker.to_string()));
    let entries = TimeEntries::new(conn).fetch(&filter)?;
    Ok(entries
        .into_iter()
        .map(|e| (e.ticket, local_date(&e.time_started), e.seconds_worked))
        .collect())
}

/// Hours overlay of a milestone on the roadmap.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneHours {
    pub name: String,
    pub estimated_hours: f64,
    pub total_seconds: i64,
    /// Creation time of the milestone's oldest ticket.
    pub since: DateTime<Utc>,
}

impl MilestoneHours {
    pub fn total_hours(&self) -> f64 {
        self.total_seconds as f64 / 3600.0
    }

    /// The timeline report for this milestone, from its oldest ticket on.
    pub fn href(&self) -> String {
        let args = [
            ("milestone".to_string(), self.name.clone()),
            ("from_date".to_string(), format_date(&self.since, ISO_DATE_FORMAT)),
            ("worker_filter".to_string(), ANY_WORKER.to_string()),
        ];
        href(HOURS_PATH, &args)
    }
}

/// Estimated and logged hours of a milestone's tickets, `None` when both
/// are zero.
pub fn milestone_hours(conn: &Connection, milestone: &Milestone) -> Result<Option<MilestoneHours>> {
    let tickets = Tickets::new(conn).in_milestone(&milestone.name)?;
    let Some(since) = tickets.iter().map(|t| t.time).min() else {
        return Ok(None);
    };

    let entries = TimeEntries::new(conn);
    let mut total_seconds = 0;
    for ticket in &tickets {
        total_seconds += entries.total_seconds(ticket.id)?;
    }
    let estimated_hours: f64 = tickets.iter().map(|t| t.estimated_hours()).sum();

    if total_seconds == 0 && estimated_hours == 0.0 {
        return Ok(None);
    }
    Ok(Some(MilestoneHours {
        name: milestone.name.clone(),
        estimated_hours,
        total_seconds,
        since,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db::Db;
    use crate::libs::entry::NewTimeEntry;
    use crate::libs::hours::Hours;
    use crate::libs::ticket::NewTicket;

    fn ticket(db: &Db, milestone: &str) -> i64 {
        let mut new = NewTicket::new("t", "joe");
        new.milestone = milestone.to_string();
        Tickets::new(&db.conn).create(&new).unwrap().id
    }

    #[test]
    fn workers_outside_the_milestone_are_listed_with_zero() {
        let mut db = Db::open_in_memory().unwrap();
        let (m1, m2) = (ticket(&db, "m1"), ticket(&db, "m2"));
        let started = Some(Utc::now() - Duration::hours(2));
        let mut hours = Hours::new(&mut db);
        hours.record_work(NewTimeEntry::new(m1, "joe", 3600).started(started)).unwrap();
        hours.record_work(NewTimeEntry::new(m2, "ann", 1800).started(started)).unwrap();

        let (from, to) = (Utc::now() - Duration::days(1), Utc::now());
        let all = hours_by_worker(&db.conn, from, to, None).unwrap();
        assert_eq!(all, vec![("ann".to_string(), 1800), ("joe".to_string(), 3600)]);
        assert_eq!(all.total_seconds(), 5400);

        let m1_only = hours_by_worker(&db.conn, from, to, Some("m1")).unwrap();
        assert_eq!(m1_only, vec![("ann".to_string(), 0), ("joe".to_string(), 3600)]);
    }

    #[test]
    fn single_worker_by_ticket() {
        let mut db = Db::open_in_memory().unwrap();
        let (a, b) = (ticket(&db, ""), ticket(&db, ""));
        let started = Some(Utc::now() - Duration::hours(2));
        let mut hours = Hours::new(&mut db);
        hours.record_work(NewTimeEntry::new(b, "joe", 600).started(started)).unwrap();
        hours.record_work(NewTimeEntry::new(a, "joe", 600).started(started)).unwrap();
        hours.record_work(NewTimeEntry::new(b, "joe", 600).started(started)).unwrap();
        hours.record_work(NewTimeEntry::new(b, "ann", 600).started(started)).unwrap();

        let (from, to) = (Utc::now() - Duration::days(1), Utc::now());
        assert_eq!(hours_by_ticket(&db.conn, "joe", from, to).unwrap(), vec![(a, 600), (b, 1200)]);
        let by_date = hours_by_date(&db.conn, "joe", from, to).unwrap();
        assert_eq!(by_date.total_seconds(), 1800);
    }

    #[test]
    fn milestone_without_hours_is_skipped() {
        let mut db = Db::open_in_memory().unwrap();
        let id = ticket(&db, "m1");
        let milestone = Milestone { name: "m1".to_string(), due: None };
        assert_eq!(milestone_hours(&db.conn, &milestone).unwrap(), None);

        Hours::new(&mut db).record_work(NewTimeEntry::new(id, "joe", 5400)).unwrap();
        let overlay = milestone_hours(&db.conn, &milestone).unwrap().unwrap();
        assert_eq!(overlay.total_hours(), 1.5);
        assert!(overlay.href().starts_with("/hours?milestone=m1&from_date="));
    }

    #[test]
    fn default_range_is_last_week() {
        let now = Utc::now();
        let (from, to) = user_range(None, None, now);
        assert_eq!(to, now);
        assert_eq!(from, start_of_day(local_date(&now)) - Duration::days(7));
    }
}
