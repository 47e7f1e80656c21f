use crate::libs::entry::{EntryFilter, NewTimeEntry, TicketSelector, TimeEntry};
use crate::libs::error::Result;
use crate::libs::formatter::from_timestamp;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;

const INSERT_ENTRY: &str = "INSERT INTO time_entry (ticket, time_submitted, worker, submitter, time_started, seconds_worked, comments)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
const SELECT_ENTRIES: &str = "SELECT id, ticket, worker, submitter, time_started, time_submitted, seconds_worked, comments FROM time_entry";
const ORDER_ENTRIES: &str = "ORDER BY time_started, id";
const UPDATE_SECONDS: &str = "UPDATE time_entry SET seconds_worked = ?1 WHERE id = ?2";
const DELETE_ENTRY: &str = "DELETE FROM time_entry WHERE id = ?1";
const DELETE_FOR_TICKET: &str = "DELETE FROM time_entry WHERE ticket = ?1";
const SUM_FOR_TICKET: &str = "SELECT COALESCE(SUM(seconds_worked), 0) FROM time_entry WHERE ticket = ?1";
const TICKETS_WITH_HOURS: &str = "SELECT DISTINCT ticket FROM time_entry";

/// Time-entry store.
///
/// Borrows a connection so the same repository works on a plain
/// connection and inside a transaction.
pub struct TimeEntries<'a> {
    conn: &'a Connection,
}

impl<'a> TimeEntries<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        TimeEntries { conn }
    }

    pub fn insert(&self, entry: &NewTimeEntry) -> Result<TimeEntry> {
        let submitted = Utc::now();
        self.conn.execute(
            INSERT_ENTRY,
            params![
                entry.ticket,
                submitted.timestamp(),
                entry.worker,
                entry.submitter,
                entry.time_started.timestamp(),
                entry.seconds_worked,
                entry.comments,
            ],
        )?;

        Ok(TimeEntry {
            id: self.conn.last_insert_rowid(),
            ticket: entry.ticket,
            worker: entry.worker.clone(),
            submitter: entry.submitter.clone(),
            time_started: from_timestamp(entry.time_started.timestamp()),
            time_submitted: from_timestamp(submitted.timestamp()),
            seconds_worked: entry.seconds_worked,
            comments: entry.comments.clone(),
        })
    }

    pub fn get(&self, id: i64) -> Result<Option<TimeEntry>> {
        let entry = self
            .conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_ENTRIES), params![id], Self::map_row)
            .optional()?;
        Ok(entry)
    }

    /// Entries matching `filter`, oldest first.
    pub fn fetch(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>> {
        if filter.tickets.is_empty() {
            return Ok(Vec::new());
        }

        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        match &filter.tickets {
            TicketSelector::One(id) => {
                clauses.push("ticket = ?".to_string());
                values.push(Value::Integer(*id));
            }
            TicketSelector::Many(ids) => {
                clauses.push(format!("ticket IN ({})", vec!["?"; ids.len()].join(", ")));
                values.extend(ids.iter().map(|id| Value::Integer(*id)));
            }
            TicketSelector::All => {}
        }
        if let Some(from) = filter.from {
            clauses.push("time_started >= ?".to_string());
            values.push(Value::Integer(from.timestamp()));
        }
        if let Some(to) = filter.to {
            clauses.push("time_started < ?".to_string());
            values.push(Value::Integer(to.timestamp()));
        }
        if let Some(worker) = filter.worker.worker() {
            clauses.push("worker = ?".to_string());
            values.push(Value::Text(worker.to_string()));
        }

        let sql = if clauses.is_empty() {
            format!("{} {}", SELECT_ENTRIES, ORDER_ENTRIES)
        } else {
            format!("{} WHERE {} {}", SELECT_ENTRIES, clauses.join(" AND "), ORDER_ENTRIES)
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn update_seconds(&self, id: i64, seconds_worked: i64) -> Result<usize> {
        Ok(self.conn.execute(UPDATE_SECONDS, params![seconds_worked, id])?)
    }

    pub fn delete(&self, id: i64) -> Result<usize> {
        Ok(self.conn.execute(DELETE_ENTRY, params![id])?)
    }

    pub fn delete_for_ticket(&self, ticket: i64) -> Result<usize> {
        Ok(self.conn.execute(DELETE_FOR_TICKET, params![ticket])?)
    }

    pub fn total_seconds(&self, ticket: i64) -> Result<i64> {
        Ok(self.conn.query_row(SUM_FOR_TICKET, params![ticket], |row| row.get(0))?)
    }

    pub fn tickets_with_hours(&self) -> Result<BTreeSet<i64>> {
        let mut stmt = self.conn.prepare(TICKETS_WITH_HOURS)?;
        let tickets = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(tickets)
    }

    fn map_row(row: &Row) -> rusqlite::Result<TimeEntry> {
        Ok(TimeEntry {
            id: row.get(0)?,
            ticket: row.get(1)?,
            worker: row.get(2)?,
            submitter: row.get(3)?,
            time_started: from_timestamp(row.get(4)?),
            time_submitted: from_timestamp(row.get(5)?),
            seconds_worked: row.get(6)?,
            comments: row.get(7)?,
        })
    }
}
