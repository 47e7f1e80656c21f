//! Aggregation engine: records work and keeps ticket totals consistent.
//!
//! Every mutation that changes the hours of a ticket runs in an immediate
//! transaction together with the recomputation of that ticket's
//! `totalhours` field, so after any call returns the field equals the sum
//! of the ticket's time entries. The bulk deletes are the exception: their
//! callers recompute once per affected ticket.

use crate::db::db::Db;
use crate::db::tickets::Tickets;
use crate::db::time_entries::TimeEntries;
use crate::libs::entry::{EntryFilter, NewTimeEntry, TimeEntry};
use crate::libs::error::{HoursError, Result};
use crate::libs::formatter::format_hours;
use crate::libs::messages::Message;
use crate::libs::permission::{Capability, Permissions};
use crate::libs::ticket::TOTAL_HOURS;
use crate::msg_debug;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of an [`Hours::edit_work`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub updated: usize,
    pub removed: usize,
}

pub struct Hours<'a> {
    db: &'a mut Db,
}

impl<'a> Hours<'a> {
    pub fn new(db: &'a mut Db) -> Self {
        Hours { db }
    }

    /// Inserts a time entry and refreshes the ticket total in one
    /// transaction.
    pub fn record_work(&mut self, entry: NewTimeEntry) -> Result<TimeEntry> {
        if entry.seconds_worked < 0 {
            return Err(HoursError::validation(Message::NegativeHours(entry.seconds_worked)));
        }

        let tx = self.db.immediate()?;
        let recorded = TimeEntries::new(&tx).insert(&entry)?;
        update_totals(&tx, &[entry.ticket])?;
        tx.commit()?;

        msg_debug!(Message::HoursRecorded {
            ticket: recorded.ticket,
            hours: format_hours(recorded.seconds_worked),
            worker: recorded.worker.clone(),
        });
        Ok(recorded)
    }

    /// Removes one entry. The ticket total is left for the caller to
    /// recompute.
    pub fn delete_work(&mut self, entry_id: i64) -> Result<TimeEntry> {
        let entries = TimeEntries::new(&self.db.conn);
        let entry = entries
            .get(entry_id)?
            .ok_or_else(|| HoursError::not_found(Message::TimeEntryNotFound(entry_id)))?;
        entries.delete(entry_id)?;
        Ok(entry)
    }

    /// Removes every entry of a ticket, returning how many were deleted.
    pub fn delete_all_work_for_ticket(&mut self, ticket_id: i64) -> Result<usize> {
        let removed = TimeEntries::new(&self.db.conn).delete_for_ticket(ticket_id)?;
        msg_debug!(Message::HoursDeletedForTicket(ticket_id));
        Ok(removed)
    }

    /// Applies `edits` (entry id to new seconds, 0 removes the entry) to the
    /// entries of `ticket_id`.
    ///
    /// Ids that do not belong to the ticket are ignored. Changing an entry
    /// logged by someone other than `actor` requires `TRAC_ADMIN`. Nothing is
    /// written unless the whole batch is allowed.
    pub fn edit_work(&mut self, ticket_id: i64, edits: &BTreeMap<i64, i64>, actor: &str, perm: &Permissions) -> Result<EditSummary> {
        let entries = TimeEntries::new(&self.db.conn).fetch(&EntryFilter::new(ticket_id))?;
        let targets: Vec<&TimeEntry> = entries.iter().filter(|e| edits.contains_key(&e.id)).collect();

        for entry in &targets {
            if entry.worker != actor {
                perm.require(Capability::TracAdmin)?;
            }
            if edits[&entry.id] < 0 {
                return Err(HoursError::validation(Message::NegativeHours(edits[&entry.id])));
            }
        }

        let mut summary = EditSummary::default();
        let tx = self.db.immediate()?;
        {
            let repo = TimeEntries::new(&tx);
            for entry in &targets {
                match edits[&entry.id] {
                    0 => summary.removed += repo.delete(entry.id)?,
                    seconds => summary.updated += repo.update_seconds(entry.id, seconds)?,
                }
            }
        }
        update_totals(&tx, &[ticket_id])?;
        tx.commit()?;

        Ok(summary)
    }

    /// Rewrites `totalhours` for each ticket from its time entries.
    pub fn recompute_totals(&mut self, ticket_ids: &[i64]) -> Result<()> {
        let tx = self.db.immediate()?;
        update_totals(&tx, ticket_ids)?;
        tx.commit()?;
        msg_debug!(Message::TotalsRecomputed(ticket_ids.len()));
        Ok(())
    }

    pub fn total_seconds_for_ticket(&self, ticket_id: i64) -> Result<i64> {
        TimeEntries::new(&self.db.conn).total_seconds(ticket_id)
    }

    /// Seconds of a ticket plus those of all its descendants. Each ticket
    /// is counted once even when relations form a cycle.
    pub fn total_seconds_with_children(&self, ticket_id: i64) -> Result<i64> {
        let entries = TimeEntries::new(&self.db.conn);
        let tickets = Tickets::new(&self.db.conn);

        let mut visited = BTreeSet::new();
        let mut pending = vec![ticket_id];
        let mut total = 0;
        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            total += entries.total_seconds(id)?;
            pending.extend(tickets.children(id)?);
        }
        Ok(total)
    }

    pub fn tickets_with_hours(&self) -> Result<BTreeSet<i64>> {
        TimeEntries::new(&self.db.conn).tickets_with_hours()
    }
}

/// Writes the summed hours of each ticket, `"0.00"` when it has none.
pub fn update_totals(conn: &Connection, ticket_ids: &[i64]) -> Result<()> {
    let entries = TimeEntries::new(conn);
    let tickets = Tickets::new(conn);
    for id in ticket_ids {
        let seconds = entries.total_seconds(*id)?;
        tickets.set_custom(*id, TOTAL_HOURS, &format_hours(seconds))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::ticket::NewTicket;

    fn setup() -> (Db, i64) {
        let db = Db::open_in_memory().unwrap();
        let id = Tickets::new(&db.conn).create(&NewTicket::new("work", "joe")).unwrap().id;
        (db, id)
    }

    fn total_field(db: &Db, id: i64) -> String {
        Tickets::new(&db.conn).require(id).unwrap().custom[TOTAL_HOURS].clone()
    }

    #[test]
    fn recording_updates_the_total_field() {
        let (mut db, id) = setup();
        let mut hours = Hours::new(&mut db);
        hours.record_work(NewTimeEntry::new(id, "joe", 5400)).unwrap();
        hours.record_work(NewTimeEntry::new(id, "ann", 1800)).unwrap();
        assert_eq!(hours.total_seconds_for_ticket(id).unwrap(), 7200);
        assert_eq!(total_field(&db, id), "2.00");
    }

    #[test]
    fn negative_durations_are_rejected_without_writing() {
        let (mut db, id) = setup();
        let mut hours = Hours::new(&mut db);
        assert!(matches!(
            hours.record_work(NewTimeEntry::new(id, "joe", -1)),
            Err(HoursError::Validation(Message::NegativeHours(-1)))
        ));
        assert!(hours.tickets_with_hours().unwrap().is_empty());
    }

    #[test]
    fn delete_all_then_recompute_gives_zero() {
        let (mut db, id) = setup();
        let mut hours = Hours::new(&mut db);
        hours.record_work(NewTimeEntry::new(id, "joe", 600)).unwrap();
        hours.record_work(NewTimeEntry::new(id, "joe", 600)).unwrap();
        assert_eq!(hours.delete_all_work_for_ticket(id).unwrap(), 2);
        hours.recompute_totals(&[id]).unwrap();
        assert_eq!(total_field(&db, id), "0.00");
    }

    #[test]
    fn unknown_entry_cannot_be_deleted() {
        let (mut db, _) = setup();
        let mut hours = Hours::new(&mut db);
        assert!(matches!(hours.delete_work(42), Err(HoursError::NotFound(Message::TimeEntryNotFound(42)))));
    }

    #[test]
    fn editing_someone_elses_hours_needs_admin() {
        let (mut db, id) = setup();
        let mut hours = Hours::new(&mut db);
        let own = hours.record_work(NewTimeEntry::new(id, "joe", 3600)).unwrap();
        let other = hours.record_work(NewTimeEntry::new(id, "ann", 3600)).unwrap();

        let user = Permissions::new([Capability::TicketAddHours]);
        let edits = BTreeMap::from([(own.id, 1800), (other.id, 0)]);
        assert!(matches!(
            hours.edit_work(id, &edits, "joe", &user),
            Err(HoursError::PermissionDenied(Capability::TracAdmin))
        ));
        assert_eq!(hours.total_seconds_for_ticket(id).unwrap(), 7200);

        let summary = hours.edit_work(id, &edits, "joe", &Permissions::all()).unwrap();
        assert_eq!(summary, EditSummary { updated: 1, removed: 1 });
        assert_eq!(total_field(&db, id), "0.50");
    }

    #[test]
    fn children_are_summed_once_even_in_cycles() {
        let (mut db, parent) = setup();
        let (child, grandchild) = {
            let tickets = Tickets::new(&db.conn);
            let child = tickets.create(&NewTicket::new("child", "joe")).unwrap().id;
            let grandchild = tickets.create(&NewTicket::new("grandchild", "joe")).unwrap().id;
            tickets.add_child(parent, child).unwrap();
            tickets.add_child(child, grandchild).unwrap();
            tickets.add_child(grandchild, parent).unwrap();
            (child, grandchild)
        };

        let mut hours = Hours::new(&mut db);
        hours.record_work(NewTimeEntry::new(parent, "joe", 3600)).unwrap();
        hours.record_work(NewTimeEntry::new(child, "joe", 1800)).unwrap();
        hours.record_work(NewTimeEntry::new(grandchild, "joe", 900)).unwrap();

        assert_eq!(hours.total_seconds_with_children(parent).unwrap(), 6300);
        assert_eq!(hours.total_seconds_with_children(grandchild).unwrap(), 6300);
    }
}
