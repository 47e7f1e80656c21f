//! Logging, editing and listing the hours of one ticket.

use super::Host;
use crate::{
    libs::{formatter::format_hours, formatter::parse_hours_minutes, messages::Message, view::View},
    msg_bail_anyhow, msg_print, msg_success,
    web::{
        page::Page,
        request::{Content, Method},
    },
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct AddArgs {
    ticket: i64,
    /// Time worked, H:MM
    hours: String,
    /// Log the hours for another worker (needs TICKET_ADMIN)
    #[arg(short, long)]
    worker: Option<String>,
    /// Day the work was done, YYYY-MM-DD
    #[arg(short, long)]
    date: Option<String>,
    #[arg(short, long)]
    comments: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    ticket: i64,
    /// New duration of an entry, ENTRY=H:MM
    #[arg(long = "set", value_parser = parse_edit)]
    set: Vec<(i64, String)>,
    /// Entry to remove
    #[arg(long = "rm")]
    remove: Vec<i64>,
}

fn parse_edit(value: &str) -> std::result::Result<(i64, String), String> {
    let (id, hours) = value.split_once('=').ok_or_else(|| format!("expected ENTRY=H:MM, got '{}'", value))?;
    let id = id.trim().parse::<i64>().map_err(|e| e.to_string())?;
    Ok((id, hours.trim().to_string()))
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    ticket: i64,
    /// Print the RSS feed of the ticket's hours
    #[arg(long)]
    rss: bool,
}

pub fn add(args: AddArgs, mut host: Host) -> Result<()> {
    let mut req = host
        .request(Method::Post, &format!("/hours/{}", args.ticket))
        .arg("addhours", "1")
        .arg("hours", &args.hours);
    if let Some(worker) = &args.worker {
        req = req.arg("worker", worker);
    }
    if let Some(date) = &args.date {
        req = req.arg("date", date);
    }
    if let Some(comments) = &args.comments {
        req = req.arg("comments", comments);
    }

    let response = host.send(&req)?;
    if response.warnings.is_empty() {
        let seconds = parse_hours_minutes(&args.hours)?;
        msg_success!(Message::HoursRecorded {
            ticket: args.ticket,
            hours: format_hours(seconds),
            worker: args.worker.unwrap_or_else(|| host.author()),
        });
    }
    Ok(())
}

pub fn edit(args: EditArgs, mut host: Host) -> Result<()> {
    let mut req = host
        .request(Method::Post, &format!("/hours/{}", args.ticket))
        .arg("edithours", "1");
    for (id, hours) in &args.set {
        req = req.arg(&format!("hours_{}", id), hours);
    }
    for id in &args.remove {
        req = req.arg(&format!("rm_{}", id), "on");
    }

    let response = host.send(&req)?;
    if response.warnings.is_empty() {
        msg_success!(Message::HoursUpdated(args.set.len() + args.remove.len()));
    }
    Ok(())
}

pub fn show(args: ShowArgs, mut host: Host) -> Result<()> {
    let mut req = host.request(Method::Get, &format!("/hours/{}", args.ticket));
    if args.rss {
        req = req.arg("format", "rss");
    }

    match host.send(&req)?.content {
        Content::Rss(xml) => msg_print!(xml),
        Content::Html(page) => match *page {
            Page::TicketHours(page) => View::ticket_hours(&page.ticket, &page.entries, page.total_seconds)?,
            _ => msg_bail_anyhow!(Message::UnknownRoute(req.path_info.clone())),
        },
        _ => msg_bail_anyhow!(Message::UnknownRoute(req.path_info.clone())),
    }
    Ok(())
}
