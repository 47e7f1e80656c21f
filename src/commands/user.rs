use super::{write_output, Host};
use crate::{
    libs::{
        formatter::{format_date, DATE_FORMAT},
        messages::Message,
        summary::SummaryTotals,
        view::View,
    },
    msg_bail_anyhow, msg_print,
    web::{
        page::Page,
        request::{Content, Method},
    },
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct UserArgs {
    /// Show one worker's hours instead of everyone's
    worker: Option<String>,
    /// First day, YYYY-MM-DD; a week ago by default
    #[arg(long)]
    from: Option<String>,
    /// Last day, YYYY-MM-DD; today by default
    #[arg(long)]
    to: Option<String>,
    /// Only count tickets of this milestone
    #[arg(long)]
    milestone: Option<String>,
    /// Sum one worker's hours per day instead of per ticket
    #[arg(long)]
    by_date: bool,
    #[arg(long)]
    csv: bool,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn cmd(args: UserArgs, mut host: Host) -> Result<()> {
    let path = match &args.worker {
        Some(worker) => format!("/hours/user/{}", worker),
        None => "/hours/user".to_string(),
    };
    let mut req = host.request(Method::Get, &path);
    if let Some(from) = &args.from {
        req = req.arg("from_date", from);
    }
    if let Some(to) = &args.to {
        req = req.arg("to_date", to);
    }
    if let Some(milestone) = &args.milestone {
        req = req.arg("milestone", milestone);
    }
    if args.by_date {
        req = req.arg("by", "date");
    }
    if args.csv {
        req = req.arg("format", "csv");
    }

    let page = match host.send(&req)?.content {
        Content::Csv(bytes) => return write_output(&bytes, args.output),
        Content::Html(page) => *page,
        _ => msg_bail_anyhow!(Message::UnknownRoute(req.path_info.clone())),
    };

    match page {
        Page::Users(users) => {
            msg_print!(range_title(Message::HoursForProject(host.env.config.project_name.clone()), &users.from, &users.to), true);
            View::worker_hours(&users.worker_hours)?;
        }
        Page::User(user) => {
            msg_print!(range_title(Message::HoursFor(user.worker.clone()), &user.from, &user.to), true);
            if args.by_date {
                View::date_totals(&user.dates, user.dates.total_seconds())?;
            } else {
                let hours: Vec<(i64, i64)> = user.tickets.iter().map(|(id, _, seconds)| (*id, *seconds)).collect();
                View::ticket_totals(&hours, user.total_seconds)?;
            }
        }
        _ => msg_bail_anyhow!(Message::UnknownRoute(req.path_info.clone())),
    }
    Ok(())
}

fn range_title(title: Message, from: &DateTime<Utc>, to: &DateTime<Utc>) -> String {
    format!("{}: {} - {}", title, format_date(from, DATE_FORMAT), format_date(to, DATE_FORMAT))
}
