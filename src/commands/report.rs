//! The hours report over the tickets matching a query.

use super::{write_output, Host};
use crate::{
    db::saved_queries::SavedQueries,
    libs::{messages::Message, view::render_html, view::View},
    msg_bail_anyhow,
    web::{
        page::Page,
        request::{parse_query_string, Content, Method, Request},
    },
};
use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Html,
    Csv,
    Rss,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Constraints such as `status=new`, `owner~=joe` or `milestone=m1&component=ui`
    query: Vec<String>,
    /// Column to show; repeat for several
    #[arg(long = "col")]
    columns: Vec<String>,
    #[arg(long)]
    order: Option<String>,
    #[arg(long)]
    desc: bool,
    /// Ticket field, `ticket`, `worker` or `date`
    #[arg(long)]
    group: Option<String>,
    /// First day, YYYY-MM-DD
    #[arg(long)]
    from: Option<String>,
    /// Last day, YYYY-MM-DD
    #[arg(long)]
    to: Option<String>,
    /// Only hours of this worker; `*any` for everyone
    #[arg(long)]
    worker: Option<String>,
    /// Show entry comments
    #[arg(long)]
    comments: bool,
    /// Run a saved query
    #[arg(long)]
    query_id: Option<i64>,
    /// Re-run the ticket query instead of reusing the cached result
    #[arg(long)]
    update: bool,
    #[arg(long)]
    page: Option<usize>,
    #[arg(long)]
    max: Option<usize>,
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
    format: ReportFormat,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ReportArgs {
    fn apply(&self, mut req: Request) -> Request {
        for constraint in &self.query {
            req = req.query_string(constraint);
        }
        for column in &self.columns {
            req = req.arg("col", column);
        }
        let optional = [
            ("order", self.order.clone()),
            ("group", self.group.clone()),
            ("from_date", self.from.clone()),
            ("to_date", self.to.clone()),
            ("worker_filter", self.worker.clone()),
            ("query_id", self.query_id.map(|id| id.to_string())),
            ("page", self.page.map(|p| p.to_string())),
            ("max", self.max.map(|m| m.to_string())),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                req = req.arg(key, &value);
            }
        }
        if self.desc {
            req = req.arg("desc", "1");
        }
        if self.comments {
            req = req.arg("row", "comments");
        }
        if self.update {
            req = req.arg("update", "1");
        }
        match self.format {
            ReportFormat::Csv => req.arg("format", "csv"),
            ReportFormat::Rss => req.arg("format", "rss"),
            ReportFormat::Table | ReportFormat::Html => req,
        }
    }
}

pub fn cmd(args: ReportArgs, mut host: Host) -> Result<()> {
    let mut req = args.apply(host.request(Method::Get, "/hours"));

    // A saved query supplies the constraints the command line leaves out.
    if let Some(id) = args.query_id.filter(|_| args.query.is_empty()) {
        let saved = SavedQueries::new(&host.env.db.conn).get(id)?;
        let stored: Vec<(String, String)> = parse_query_string(&saved.query)
            .into_iter()
            .filter(|(k, _)| !req.has_arg(k))
            .collect();
        req.args.extend(stored);
    }

    match host.send(&req)?.content {
        Content::Csv(bytes) => write_output(&bytes, args.output),
        Content::Rss(xml) => write_output(xml.as_bytes(), args.output),
        Content::Html(page) => match *page {
            Page::Timeline(report) if args.format == ReportFormat::Html => write_output(render_html(&report).as_bytes(), args.output),
            Page::Timeline(report) => Ok(View::report(&report)?),
            _ => msg_bail_anyhow!(Message::UnknownRoute(req.path_info.clone())),
        },
        Content::Redirect(location) => msg_bail_anyhow!(Message::UnknownRoute(location)),
    }
}
