//! The host's ticket lifecycle: manipulators vet a change before it is
//! written, listeners hear about it afterwards.

use super::component::{ComponentManager, FieldProblem};
use super::request::Request;
use crate::db::tickets::Tickets;
use crate::libs::env::Env;
use crate::libs::error::Result;
use crate::libs::messages::Message;
use crate::libs::ticket::{NewTicket, Ticket};
use crate::msg_debug;
use std::collections::BTreeMap;

/// A pending edit of a ticket: custom field values and a comment.
#[derive(Debug, Clone)]
pub struct TicketChange {
    pub ticket: Ticket,
    pub fields: BTreeMap<String, String>,
    pub comment: String,
    pub author: String,
}

impl TicketChange {
    pub fn new(ticket: Ticket, author: &str) -> Self {
        TicketChange {
            ticket,
            fields: BTreeMap::new(),
            comment: String::new(),
            author: author.to_string(),
        }
    }

    pub fn set(mut self, field: &str, value: &str) -> Self {
        self.fields.insert(field.to_string(), value.to_string());
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.comment = text.to_string();
        self
    }

    /// The pending value of `field`, else the ticket's current one.
    pub fn value(&self, field: &str) -> Option<String> {
        self.fields.get(field).cloned().or_else(|| self.ticket.field(field))
    }
}

impl ComponentManager {
    pub fn create_ticket(&self, env: &mut Env, ticket: &NewTicket) -> Result<Ticket> {
        let created = Tickets::new(&env.db.conn).create(ticket)?;
        for listener in self.listeners() {
            listener.ticket_created(env, &created)?;
        }
        msg_debug!(Message::TicketCreated(created.id));
        Ok(created)
    }

    /// Validates and saves `change`. When a manipulator objects, nothing
    /// is written and the problems are returned.
    pub fn save_ticket_change(&self, env: &mut Env, req: &Request, mut change: TicketChange) -> Result<Vec<FieldProblem>> {
        let mut problems = Vec::new();
        for manipulator in self.manipulators() {
            problems.extend(manipulator.validate_ticket(env, req, &mut change)?);
        }
        if !problems.is_empty() {
            return Ok(problems);
        }

        let id = change.ticket.id;
        let ticket = {
            let tx = env.db.immediate()?;
            let tickets = Tickets::new(&tx);
            for (field, value) in &change.fields {
                let old = change.ticket.field(field).unwrap_or_default();
                if old != *value {
                    tickets.change_custom(id, &change.author, field, &old, value)?;
                }
            }
            if !change.comment.trim().is_empty() {
                tickets.add_comment(id, &change.author, &change.comment)?;
            }
            let ticket = tickets.require(id)?;
            tx.commit()?;
            ticket
        };

        for listener in self.listeners() {
            listener.ticket_changed(env, &ticket, &change.comment, &change.author)?;
        }
        msg_debug!(Message::CommentSaved(id));
        Ok(problems)
    }

    pub fn delete_ticket(&self, env: &mut Env, id: i64) -> Result<Ticket> {
        let tickets = Tickets::new(&env.db.conn);
        let ticket = tickets.require(id)?;
        tickets.delete(id)?;

        for listener in self.listeners() {
            listener.ticket_deleted(env, &ticket)?;
        }
        msg_debug!(Message::TicketDeleted(id));
        Ok(ticket)
    }
}
