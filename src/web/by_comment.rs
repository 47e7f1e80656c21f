//! Hours logged by writing "1.5 hours" or "1:30 hours" in a ticket comment.

use super::component::{Component, FieldProblem, Interface, TicketChangeListener, TicketManipulator};
use super::request::Request;
use super::ticket_change::TicketChange;
use crate::libs::comment::{add_hours_by_comment, munge_comment};
use crate::libs::env::Env;
use crate::libs::error::Result;
use crate::libs::hours::Hours;
use crate::libs::permission::Capability;
use crate::libs::ticket::Ticket;

#[cfg(feature = "email")]
use super::component::EmailHandler;
#[cfg(feature = "email")]
use super::email::{EmailMessage, EmailPart};
#[cfg(feature = "email")]
use crate::msg_debug;

pub struct HoursByComment;

impl Component for HoursByComment {
    fn name(&self) -> &'static str {
        "HoursByComment"
    }

    fn interfaces(&self) -> Vec<Interface> {
        #[allow(unused_mut)]
        let mut interfaces = vec![Interface::TicketChangeListener, Interface::TicketManipulator];
        #[cfg(feature = "email")]
        interfaces.push(Interface::EmailHandler);
        interfaces
    }

    fn ticket_change_listener(&self) -> Option<&dyn TicketChangeListener> {
        Some(self)
    }

    fn ticket_manipulator(&self) -> Option<&dyn TicketManipulator> {
        Some(self)
    }

    #[cfg(feature = "email")]
    fn email_handler(&self) -> Option<&dyn EmailHandler> {
        Some(self)
    }
}

impl TicketManipulator for HoursByComment {
    /// Links the hours phrases of the comment to the ticket's hours page.
    fn validate_ticket(&self, _env: &mut Env, req: &Request, change: &mut TicketChange) -> Result<Vec<FieldProblem>> {
        if req.perm.has(Capability::TicketAddHours) && !change.comment.is_empty() {
            change.comment = munge_comment(&change.comment, change.ticket.id);
        }
        Ok(Vec::new())
    }
}

impl TicketChangeListener for HoursByComment {
    fn ticket_changed(&self, env: &mut Env, ticket: &Ticket, comment: &str, author: &str) -> Result<()> {
        if env.config.permissions_for(Some(author)).has(Capability::TicketAddHours) {
            add_hours_by_comment(&mut Hours::new(&mut env.db), comment, ticket.id, author)?;
        }
        Ok(())
    }

    fn ticket_deleted(&self, env: &mut Env, ticket: &Ticket) -> Result<()> {
        let mut hours = Hours::new(&mut env.db);
        hours.delete_all_work_for_ticket(ticket.id)?;
        hours.recompute_totals(&[ticket.id])
    }
}

#[cfg(feature = "email")]
impl EmailHandler for HoursByComment {
    /// Replies to a ticket from a sender allowed to log hours.
    fn match_message(&self, env: &Env, message: &EmailMessage) -> Result<bool> {
        let Some(ticket) = message.reply_ticket(&env.db.conn)? else {
            return Ok(false);
        };
        let perm = env.config.permissions_for(Some(message.sender()));
        msg_debug!(format!("Mail from {} replies to ticket #{}", message.sender(), ticket.id));
        Ok(perm.has(Capability::TicketAddHours))
    }

    fn invoke(&self, env: &Env, mut message: EmailMessage) -> Result<EmailMessage> {
        let Some(ticket) = message.reply_ticket(&env.db.conn)? else {
            return Ok(message);
        };
        munge_parts(&mut message.parts, ticket.id);
        Ok(message)
    }
}

/// Rewrites inline text parts, descending into multipart containers.
#[cfg(feature = "email")]
fn munge_parts(parts: &mut [EmailPart], ticket_id: i64) {
    for part in parts {
        if !part.parts.is_empty() {
            munge_parts(&mut part.parts, ticket_id);
        } else if part.is_inline_text() {
            part.body = munge_comment(&part.body, ticket_id);
        }
    }
}
