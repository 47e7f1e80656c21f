use crate::libs::error::{HoursError, Result};
use crate::libs::formatter::from_timestamp;
use crate::libs::messages::Message;
use crate::libs::query::TicketQuery;
use crate::libs::ticket::{Milestone, NewTicket, Ticket, TicketComment, ESTIMATED_HOURS, TOTAL_HOURS};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

const INSERT_TICKET: &str = "INSERT INTO ticket (time, changetime, component, owner, reporter, milestone, status, summary)
    VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)";
const SELECT_TICKETS: &str = "SELECT id, type, time, changetime, component, priority, owner, reporter, milestone, status,
    resolution, summary, description, keywords FROM ticket";
const SELECT_CUSTOM: &str = "SELECT ticket, name, value FROM ticket_custom";
const UPSERT_CUSTOM: &str = "INSERT INTO ticket_custom (ticket, name, value) SELECT id, ?2, ?3 FROM ticket WHERE id = ?1
    ON CONFLICT(ticket, name) DO UPDATE SET value = excluded.value";
const INSERT_CHANGE: &str = "INSERT INTO ticket_change (ticket, time, author, field, oldvalue, newvalue) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const TOUCH_TICKET: &str = "UPDATE ticket SET changetime = ?1 WHERE id = ?2";
const SELECT_COMMENTS: &str = "SELECT time, author, newvalue FROM ticket_change WHERE ticket = ?1 AND field = 'comment' ORDER BY time, rowid";
const DELETE_TICKET: &str = "DELETE FROM ticket WHERE id = ?1";
const DELETE_CUSTOM: &str = "DELETE FROM ticket_custom WHERE ticket = ?1";
const DELETE_CHANGES: &str = "DELETE FROM ticket_change WHERE ticket = ?1";
const DELETE_RELATIONS: &str = "DELETE FROM ticket_relations WHERE oneself = ?1 OR ticket = ?1";
const INSERT_RELATION: &str = "INSERT OR IGNORE INTO ticket_relations (oneself, ticket, relations) VALUES (?1, ?2, ?3)";
const SELECT_CHILDREN: &str = "SELECT ticket FROM ticket_relations WHERE oneself = ?1 AND relations = 'child' ORDER BY ticket";
const SELECT_MILESTONE_TICKETS: &str = "SELECT id FROM ticket WHERE milestone = ?1 ORDER BY id";
const INSERT_MILESTONE: &str = "INSERT INTO milestone (name, due) VALUES (?1, ?2)";
const SELECT_MILESTONES: &str = "SELECT name, due FROM milestone ORDER BY COALESCE(due, 9223372036854775807), name";

/// Result of a ticket query.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTickets {
    /// Matching tickets of the requested page, in query order.
    pub tickets: Vec<Ticket>,
    /// The same tickets split by the query's group field. Without a group
    /// field there is a single group with an empty label.
    pub groups: Vec<(String, Vec<Ticket>)>,
}

impl ResolvedTickets {
    pub fn ids(&self) -> Vec<i64> {
        self.tickets.iter().map(|t| t.id).collect()
    }
}

/// Access to the host tracker's tickets, comments, relations and milestones.
pub struct Tickets<'a> {
    conn: &'a Connection,
}

impl<'a> Tickets<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Tickets { conn }
    }

    pub fn create(&self, ticket: &NewTicket) -> Result<Ticket> {
        self.conn.execute(
            INSERT_TICKET,
            params![
                Utc::now().timestamp(),
                ticket.component,
                ticket.owner,
                ticket.reporter,
                ticket.milestone,
                ticket.status,
                ticket.summary,
            ],
        )?;
        let id = self.conn.last_insert_rowid();

        self.set_custom(id, TOTAL_HOURS, "0")?;
        self.set_custom(id, ESTIMATED_HOURS, ticket.estimated_hours.as_deref().unwrap_or("0"))?;

        self.require(id)
    }

    pub fn get(&self, id: i64) -> Result<Option<Ticket>> {
        Ok(self.load(Some(&[id]))?.into_iter().next())
    }

    pub fn require(&self, id: i64) -> Result<Ticket> {
        self.get(id)?.ok_or_else(|| HoursError::not_found(Message::TicketNotFound(id)))
    }

    /// Sets a custom field; a no-op for tickets that do not exist.
    pub fn set_custom(&self, id: i64, name: &str, value: &str) -> Result<()> {
        self.conn.execute(UPSERT_CUSTOM, params![id, name, value])?;
        Ok(())
    }

    /// Appends a comment to the ticket's change log.
    pub fn add_comment(&self, id: i64, author: &str, text: &str) -> Result<()> {
        let now = Utc::now().timestamp();
        self.conn.execute(INSERT_CHANGE, params![id, now, author, "comment", "", text])?;
        self.conn.execute(TOUCH_TICKET, params![now, id])?;
        Ok(())
    }

    /// Records a field change and stores the new value.
    pub fn change_custom(&self, id: i64, author: &str, name: &str, old: &str, new: &str) -> Result<()> {
        let now = Utc::now().timestamp();
        self.set_custom(id, name, new)?;
        self.conn.execute(INSERT_CHANGE, params![id, now, author, name, old, new])?;
        self.conn.execute(TOUCH_TICKET, params![now, id])?;
        Ok(())
    }

    pub fn comments(&self, id: i64) -> Result<Vec<TicketComment>> {
        let mut stmt = self.conn.prepare(SELECT_COMMENTS)?;
        let comments = stmt
            .query_map(params![id], |row| {
                Ok(TicketComment {
                    time: from_timestamp(row.get(0)?),
                    author: row.get(1)?,
                    text: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    /// Removes the ticket with its custom fields, changes and relations.
    pub fn delete(&self, id: i64) -> Result<usize> {
        self.conn.execute(DELETE_CUSTOM, params![id])?;
        self.conn.execute(DELETE_CHANGES, params![id])?;
        self.conn.execute(DELETE_RELATIONS, params![id])?;
        Ok(self.conn.execute(DELETE_TICKET, params![id])?)
    }

    pub fn add_child(&self, parent: i64, child: i64) -> Result<()> {
        self.conn.execute(INSERT_RELATION, params![parent, child, "child"])?;
        self.conn.execute(INSERT_RELATION, params![child, parent, "parent"])?;
        Ok(())
    }

    pub fn children(&self, id: i64) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(SELECT_CHILDREN)?;
        let children = stmt
            .query_map(params![id], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(children)
    }

    pub fn create_milestone(&self, name: &str, due: Option<chrono::DateTime<Utc>>) -> Result<()> {
        self.conn.execute(INSERT_MILESTONE, params![name, due.map(|d| d.timestamp())])?;
        Ok(())
    }

    /// Milestones by due date; undated ones last.
    pub fn milestones(&self) -> Result<Vec<Milestone>> {
        let mut stmt = self.conn.prepare(SELECT_MILESTONES)?;
        let milestones = stmt
            .query_map([], |row| {
                Ok(Milestone {
                    name: row.get(0)?,
                    due: row.get::<_, Option<i64>>(1)?.map(from_timestamp),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(milestones)
    }

    pub fn in_milestone(&self, milestone: &str) -> Result<Vec<Ticket>> {
        let mut stmt = self.conn.prepare(SELECT_MILESTONE_TICKETS)?;
        let ids = stmt
            .query_map(params![milestone], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.load(Some(&ids))
    }

    /// Runs a ticket query.
    ///
    /// With `cached_ids` the constraints are not evaluated: only the listed
    /// tickets are considered. Ordering, grouping and paging always apply.
    pub fn resolve(&self, query: &TicketQuery, cached_ids: Option<&[i64]>) -> Result<ResolvedTickets> {
        let mut tickets = match cached_ids {
            Some(ids) => self.load(Some(ids))?,
            None => self
                .load(None)?
                .into_iter()
                .filter(|ticket| {
                    query
                        .constraints
                        .iter()
                        .all(|(field, c)| c.accepts(&ticket.field(field).unwrap_or_default()))
                })
                .collect(),
        };

        let order = query.order.as_deref().unwrap_or("id");
        tickets.sort_by(|a, b| {
            let ordering = compare_field(a, b, order).then(a.id.cmp(&b.id));
            if query.desc {
                ordering.reverse()
            } else {
                ordering
            }
        });

        if let Some(group) = query.group.as_deref() {
            tickets.sort_by(|a, b| {
                let ordering = compare_field(a, b, group);
                if query.groupdesc {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        if query.max > 0 {
            // A page past the addressable range is empty.
            tickets = match query.page.saturating_sub(1).checked_mul(query.max) {
                Some(skip) => tickets.into_iter().skip(skip).take(query.max).collect(),
                None => Vec::new(),
            };
        }

        let mut groups: Vec<(String, Vec<Ticket>)> = Vec::new();
        for ticket in &tickets {
            let key = match query.group.as_deref() {
                Some(group) => ticket.field(group).unwrap_or_default(),
                None => String::new(),
            };
            match groups.last_mut() {
                Some((last, members)) if *last == key => members.push(ticket.clone()),
                _ => groups.push((key, vec![ticket.clone()])),
            }
        }

        Ok(ResolvedTickets { tickets, groups })
    }

    /// Loads tickets with their custom fields. `Some(ids)` keeps the order
    /// of `ids` and skips unknown ones; `None` loads every ticket by id.
    fn load(&self, ids: Option<&[i64]>) -> Result<Vec<Ticket>> {
        let (sql, custom_sql, values): (String, String, Vec<i64>) = match ids {
            Some(ids) if ids.is_empty() => return Ok(Vec::new()),
            Some(ids) => {
                let marks = vec!["?"; ids.len()].join(", ");
                (
                    format!("{} WHERE id IN ({})", SELECT_TICKETS, marks),
                    format!("{} WHERE ticket IN ({})", SELECT_CUSTOM, marks),
                    ids.to_vec(),
                )
            }
            None => (format!("{} ORDER BY id", SELECT_TICKETS), SELECT_CUSTOM.to_string(), Vec::new()),
        };

        let mut custom: HashMap<i64, BTreeMap<String, String>> = HashMap::new();
        let mut stmt = self.conn.prepare(&custom_sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        while let Some(row) = rows.next()? {
            custom.entry(row.get(0)?).or_default().insert(row.get(1)?, row.get(2)?);
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut tickets = stmt
            .query_map(params_from_iter(values.iter()), Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for ticket in tickets.iter_mut() {
            if let Some(fields) = custom.remove(&ticket.id) {
                ticket.custom = fields;
            }
        }

        if let Some(ids) = ids {
            let mut by_id: HashMap<i64, Ticket> = tickets.into_iter().map(|t| (t.id, t)).collect();
            tickets = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        }

        Ok(tickets)
    }

    fn map_row(row: &Row) -> rusqlite::Result<Ticket> {
        Ok(Ticket {
            id: row.get(0)?,
            ticket_type: row.get(1)?,
            time: from_timestamp(row.get(2)?),
            changetime: from_timestamp(row.get(3)?),
            component: row.get(4)?,
            priority: row.get(5)?,
            owner: row.get(6)?,
            reporter: row.get(7)?,
            milestone: row.get(8)?,
            status: row.get(9)?,
            resolution: row.get(10)?,
            summary: row.get(11)?,
            description: row.get(12)?,
            keywords: row.get(13)?,
            custom: BTreeMap::new(),
        })
    }
}

/// Orders two tickets on a field, numerically when both values are numbers.
fn compare_field(a: &Ticket, b: &Ticket, field: &str) -> Ordering {
    let (a, b) = (a.field(field).unwrap_or_default(), b.field(field).unwrap_or_default());
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(&b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db::Db;
    use crate::libs::query::ConstraintSet;

    fn ticket(tickets: &Tickets, summary: &str, milestone: &str, status: &str) -> Ticket {
        let mut new = NewTicket::new(summary, "joe");
        new.milestone = milestone.to_string();
        new.status = status.to_string();
        tickets.create(&new).unwrap()
    }

    #[test]
    fn created_tickets_start_with_zero_totals() {
        let db = Db::open_in_memory().unwrap();
        let tickets = Tickets::new(&db.conn);
        let created = ticket(&tickets, "first", "", "new");
        assert_eq!(created.custom.get(TOTAL_HOURS).map(String::as_str), Some("0"));
        assert_eq!(created.custom.get(ESTIMATED_HOURS).map(String::as_str), Some("0"));
        assert!(tickets.get(created.id + 1).unwrap().is_none());
    }

    #[test]
    fn resolve_filters_orders_and_groups() {
        let db = Db::open_in_memory().unwrap();
        let tickets = Tickets::new(&db.conn);
        let a = ticket(&tickets, "a", "m2", "new");
        let b = ticket(&tickets, "b", "m1", "closed");
        let c = ticket(&tickets, "c", "m1", "new");
        ticket(&tickets, "d", "m1", "bogus");

        let mut query = TicketQuery::new(ConstraintSet::parse("status!=bogus").unwrap());
        query.group = Some("milestone".to_string());
        let resolved = tickets.resolve(&query, None).unwrap();

        assert_eq!(resolved.ids(), vec![b.id, c.id, a.id]);
        assert_eq!(resolved.groups.len(), 2);
        assert_eq!(resolved.groups[0].0, "m1");
        assert_eq!(resolved.groups[1].1[0].id, a.id);

        query.group = None;
        query.desc = true;
        query.max = 2;
        query.page = 2;
        let page = tickets.resolve(&query, None).unwrap();
        assert_eq!(page.ids(), vec![a.id]);
    }

    #[test]
    fn huge_page_numbers_give_an_empty_page() {
        let db = Db::open_in_memory().unwrap();
        let tickets = Tickets::new(&db.conn);
        ticket(&tickets, "a", "", "new");

        let mut query = TicketQuery::new(ConstraintSet::parse("status=new").unwrap());
        query.page = usize::MAX / 2;
        query.max = 100;
        assert!(tickets.resolve(&query, None).unwrap().ids().is_empty());
    }

    #[test]
    fn cached_ids_bypass_constraints() {
        let db = Db::open_in_memory().unwrap();
        let tickets = Tickets::new(&db.conn);
        let a = ticket(&tickets, "a", "", "new");
        let b = ticket(&tickets, "b", "", "closed");

        let query = TicketQuery::new(ConstraintSet::parse("status=new").unwrap());
        let resolved = tickets.resolve(&query, Some(&[b.id, a.id, 99])).unwrap();
        assert_eq!(resolved.ids(), vec![a.id, b.id]);
    }

    #[test]
    fn delete_removes_relations_and_fields() {
        let db = Db::open_in_memory().unwrap();
        let tickets = Tickets::new(&db.conn);
        let parent = ticket(&tickets, "parent", "", "new");
        let child = ticket(&tickets, "child", "", "new");
        tickets.add_child(parent.id, child.id).unwrap();
        tickets.add_comment(child.id, "joe", "started").unwrap();
        assert_eq!(tickets.children(parent.id).unwrap(), vec![child.id]);
        assert_eq!(tickets.comments(child.id).unwrap()[0].text, "started");

        assert_eq!(tickets.delete(child.id).unwrap(), 1);
        assert!(tickets.children(parent.id).unwrap().is_empty());
        assert!(tickets.comments(child.id).unwrap().is_empty());
    }
}
