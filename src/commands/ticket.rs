use super::Host;
use crate::{
    db::tickets::Tickets,
    libs::{messages::Message, ticket::NewTicket, ticket::ESTIMATED_HOURS, view::View},
    msg_success, msg_warning,
    web::{page::HostPage, request::Method, ticket_change::TicketChange},
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct TicketArgs {
    #[command(subcommand)]
    command: TicketCommand,
}

#[derive(Debug, Subcommand)]
enum TicketCommand {
    /// Create a ticket
    New {
        summary: String,
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        milestone: Option<String>,
        #[arg(long)]
        component: Option<String>,
        /// Estimated hours, decimal
        #[arg(long)]
        estimate: Option<String>,
    },
    /// Show a ticket with its comments
    Show { id: i64 },
    /// Comment on a ticket; "2 hours" or "1:30 hours" in the text logs hours
    Comment { id: i64, text: String },
    /// Set the estimated hours
    Estimate { id: i64, hours: String },
    /// Make one ticket the child of another
    Child { parent: i64, child: i64 },
    /// Delete a ticket with all of its hours
    Delete { id: i64 },
}

pub fn cmd(args: TicketArgs, host: Host) -> Result<()> {
    match args.command {
        TicketCommand::New {
            summary,
            owner,
            milestone,
            component,
            estimate,
        } => handle_new(host, summary, owner, milestone, component, estimate),
        TicketCommand::Show { id } => handle_show(host, id),
        TicketCommand::Comment { id, text } => handle_change(host, id, None, text),
        TicketCommand::Estimate { id, hours } => handle_change(host, id, Some(hours), String::new()),
        TicketCommand::Child { parent, child } => handle_child(host, parent, child),
        TicketCommand::Delete { id } => handle_delete(host, id),
    }
}

fn handle_new(
    mut host: Host,
    summary: String,
    owner: Option<String>,
    milestone: Option<String>,
    component: Option<String>,
    estimate: Option<String>,
) -> Result<()> {
    let mut ticket = NewTicket::new(&summary, &host.author());
    ticket.owner = owner.unwrap_or_default();
    ticket.milestone = milestone.unwrap_or_default();
    ticket.component = component.unwrap_or_default();

    let created = host.manager.create_ticket(&mut host.env, &ticket)?;
    msg_success!(Message::TicketCreated(created.id));

    match estimate {
        Some(hours) => handle_change(host, created.id, Some(hours), String::new()),
        None => Ok(()),
    }
}

fn handle_show(mut host: Host, id: i64) -> Result<()> {
    let tickets = Tickets::new(&host.env.db.conn);
    let ticket = tickets.require(id)?;
    let comments = tickets.comments(id)?;

    let req = host.request(Method::Get, &format!("/ticket/{}", id));
    let mut page = HostPage::Ticket {
        ticket: Some(ticket.clone()),
        total_hours: None,
    };
    host.manager.filter_page(&mut host.env, &req, &mut page)?;
    let HostPage::Ticket { total_hours, .. } = page else {
        return Ok(());
    };

    View::ticket(&ticket, &comments, total_hours.as_ref())?;
    Ok(())
}

/// Sends a comment or a new estimate through the ticket manipulators and
/// listeners.
fn handle_change(mut host: Host, id: i64, estimate: Option<String>, comment: String) -> Result<()> {
    let ticket = Tickets::new(&host.env.db.conn).require(id)?;
    let req = host.request(Method::Post, &format!("/ticket/{}", id));

    let mut change = TicketChange::new(ticket, &host.author()).comment(&comment);
    if let Some(hours) = &estimate {
        change = change.set(ESTIMATED_HOURS, hours);
    }

    let problems = host.manager.save_ticket_change(&mut host.env, &req, change)?;
    if !problems.is_empty() {
        for (_, problem) in problems {
            msg_warning!(problem);
        }
        return Ok(());
    }

    match estimate {
        Some(hours) => msg_success!(Message::EstimatedHoursUpdated(id, hours)),
        None => msg_success!(Message::CommentSaved(id)),
    }
    Ok(())
}

fn handle_child(host: Host, parent: i64, child: i64) -> Result<()> {
    let tickets = Tickets::new(&host.env.db.conn);
    tickets.require(parent)?;
    tickets.require(child)?;
    tickets.add_child(parent, child)?;
    msg_success!(Message::TicketChildAdded(parent, child));
    Ok(())
}

fn handle_delete(mut host: Host, id: i64) -> Result<()> {
    host.manager.delete_ticket(&mut host.env, id)?;
    msg_success!(Message::TicketDeleted(id));
    Ok(())
}
