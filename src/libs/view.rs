use super::entry::TimeEntry;
use super::error::Result;
use super::export::escape_xml;
use super::formatter::{format_date, format_hours, format_hours_minutes_padded, DATE_FORMAT, ISO_DATE_FORMAT};
use super::messages::Message;
use super::query::SavedQuery;
use super::report::Report;
use super::summary::MilestoneHours;
use super::ticket::{Ticket, TicketComment, ESTIMATED_HOURS, TOTAL_HOURS};
use crate::web::page::TotalHoursField;
use chrono::NaiveDate;
use prettytable::{row, Cell, Row, Table};

pub struct View {}

impl View {
    pub fn report(report: &Report) -> Result<()> {
        println!("{}", report.title);
        for warning in &report.warnings {
            println!("{}", warning);
        }
        if report.groups.is_empty() {
            println!("{}", Message::NoHoursFound);
            return Ok(());
        }

        for group in &report.groups {
            let mut table = Table::new();
            if !group.label.is_empty() {
                println!("\n{}", group.label);
            }
            table.set_titles(report.headers.iter().map(|h| h.label.as_str()).collect());
            for row in &group.rows {
                table.add_row(report.columns.iter().map(|c| row.value(c)).collect());
                if report.show_comments && !row.entry.comments.is_empty() {
                    table.add_row(Row::new(vec![Cell::new(&row.entry.comments).with_hspan(report.columns.len())]));
                }
            }
            table.printstd();
            println!("Total: {}  Estimated: {}", group.total_hours(), group.estimated_hours());
        }

        Ok(())
    }

    /// Entries of one ticket, newest first.
    pub fn ticket_hours(ticket: &Ticket, entries: &[TimeEntry], total_seconds: i64) -> Result<()> {
        let mut entries: Vec<&TimeEntry> = entries.iter().collect();
        entries.sort_by(|a, b| b.time_started.cmp(&a.time_started));

        println!("{}: {}", Message::HoursForTicket(ticket.id), ticket.summary);
        let mut table = Table::new();
        table.add_row(row!["ID", "WORKER", "DATE", "HOURS", "SUBMITTED BY", "COMMENTS"]);
        for entry in entries {
            table.add_row(row![
                entry.id,
                entry.worker,
                format_date(&entry.time_started, DATE_FORMAT),
                format_hours_minutes_padded(entry.seconds_worked),
                entry.submitter,
                entry.comments
            ]);
        }
        table.printstd();
        println!("Total: {}", format_hours(total_seconds));

        Ok(())
    }

    /// Ticket fields and comments. `total_hours` replaces the stored total
    /// when the hours field was rendered for the viewer.
    pub fn ticket(ticket: &Ticket, comments: &[TicketComment], total_hours: Option<&TotalHoursField>) -> Result<()> {
        let mut table = Table::new();
        table.add_row(row!["ID", ticket.id]);
        table.add_row(row!["SUMMARY", ticket.summary]);
        table.add_row(row!["STATUS", ticket.status]);
        table.add_row(row!["OWNER", ticket.owner]);
        table.add_row(row!["REPORTER", ticket.reporter]);
        table.add_row(row!["MILESTONE", ticket.milestone]);
        table.add_row(row!["ESTIMATED HOURS", ticket.custom.get(ESTIMATED_HOURS).cloned().unwrap_or_default()]);
        match total_hours {
            Some(field) => {
                let mut hours = field.hours.clone();
                if let Some(with_children) = &field.with_children {
                    hours.push_str(&format!(" ({} h)", with_children));
                }
                table.add_row(row!["TOTAL HOURS", hours]);
            }
            None => {
                table.add_row(row!["TOTAL HOURS", ticket.custom.get(TOTAL_HOURS).cloned().unwrap_or_default()]);
            }
        }
        table.printstd();

        if !comments.is_empty() {
            let mut table = Table::new();
            table.add_row(row!["DATE", "AUTHOR", "COMMENT"]);
            for comment in comments {
                table.add_row(row![format_date(&comment.time, DATE_FORMAT), comment.author, comment.text]);
            }
            table.printstd();
        }

        Ok(())
    }

    pub fn queries(queries: &[SavedQuery]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["ID", "TITLE", "DESCRIPTION", "QUERY"]);
        for query in queries {
            table.add_row(row![query.id, query.title, query.description, query.query]);
        }
        table.printstd();

        Ok(())
    }

    pub fn worker_hours(hours: &[(String, i64)]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["WORKER", "HOURS"]);
        for (worker, seconds) in hours {
            table.add_row(row![worker, format_hours(*seconds)]);
        }
        table.printstd();

        Ok(())
    }

    pub fn ticket_totals(hours: &[(i64, i64)], total_seconds: i64) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["TICKET", "HOURS"]);
        for (ticket, seconds) in hours {
            table.add_row(row![ticket, format_hours(*seconds)]);
        }
        table.add_row(row!["TOTAL", format_hours(total_seconds)]);
        table.printstd();

        Ok(())
    }

    pub fn date_totals(hours: &[(NaiveDate, i64)], total_seconds: i64) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["DATE", "HOURS"]);
        for (date, seconds) in hours {
            table.add_row(row![date.format(ISO_DATE_FORMAT), format_hours(*seconds)]);
        }
        table.add_row(row!["TOTAL", format_hours(total_seconds)]);
        table.printstd();

        Ok(())
    }

    pub fn milestones(milestones: &[MilestoneHours]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["MILESTONE", "ESTIMATED HOURS", "TOTAL HOURS", "REPORT"]);
        for milestone in milestones {
            table.add_row(row![
                milestone.name,
                format!("{:.2}", milestone.estimated_hours),
                format!("{:.2}", milestone.total_hours()),
                milestone.href()
            ]);
        }
        table.printstd();

        Ok(())
    }
}

/// The report as an HTML fragment: one table per group with sortable
/// headers, group totals and the navigation links.
pub fn render_html(report: &Report) -> String {
    let mut html = format!("<h1>{}</h1>\n", escape_xml(&report.title));

    if let Some(title) = &report.query_title {
        html.push_str(&format!("<h2>{}</h2>\n", escape_xml(title)));
    }
    if let Some(description) = report.query_description.as_ref().filter(|d| !d.is_empty()) {
        html.push_str(&format!("<p class=\"description\">{}</p>\n", escape_xml(description)));
    }
    for warning in &report.warnings {
        html.push_str(&format!("<p class=\"warning\">{}</p>\n", escape_xml(&warning.to_string())));
    }

    for group in &report.groups {
        if !group.label.is_empty() {
            html.push_str(&format!("<h3>{}</h3>\n", escape_xml(&group.label)));
        }
        html.push_str("<table class=\"listing tickets\">\n<thead><tr>");
        for header in &report.headers {
            html.push_str(&format!("<th><a href=\"{}\">{}</a></th>", escape_xml(&header.href), escape_xml(&header.label)));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in &group.rows {
            html.push_str("<tr>");
            for column in &report.columns {
                html.push_str(&format!("<td class=\"{}\">{}</td>", escape_xml(column), escape_xml(&row.value(column))));
            }
            html.push_str("</tr>\n");
            if report.show_comments && !row.entry.comments.is_empty() {
                html.push_str(&format!(
                    "<tr class=\"comments\"><td colspan=\"{}\">{}</td></tr>\n",
                    report.columns.len(),
                    escape_xml(&row.entry.comments)
                ));
            }
        }
        html.push_str(&format!(
            "<tr class=\"total\"><td colspan=\"{}\">Total: {} (estimated: {})</td></tr>\n",
            report.columns.len(),
            group.total_hours(),
            group.estimated_hours()
        ));
        html.push_str("</tbody>\n</table>\n");
    }

    if report.groups.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", Message::NoHoursFound));
    }

    html.push_str(&format!(
        "<p class=\"nav\"><a href=\"{}\">Prev Week</a> <a href=\"{}\">Next Week</a> <a href=\"{}\">RSS Feed</a> <a href=\"{}\">CSV</a></p>\n",
        escape_xml(&report.links.prev),
        escape_xml(&report.links.next),
        escape_xml(&report.links.rss),
        escape_xml(&report.links.csv)
    ));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db::Db;
    use crate::db::tickets::Tickets;
    use crate::libs::config::Config;
    use crate::libs::entry::NewTimeEntry;
    use crate::libs::hours::Hours;
    use crate::libs::report::{build_report, resolve_tickets, ReportParams};
    use crate::libs::ticket::NewTicket;
    use chrono::{Duration, Utc};

    #[test]
    fn html_escapes_text_and_links_sortable_headers() {
        let mut db = Db::open_in_memory().unwrap();
        let id = Tickets::new(&db.conn).create(&NewTicket::new("<script>", "joe")).unwrap().id;
        let started = Utc::now() - Duration::hours(1);
        Hours::new(&mut db)
            .record_work(NewTimeEntry::new(id, "joe", 3600).started(Some(started)).comments(Some("<b>fixed</b> & done")))
            .unwrap();

        let config = Config::default();
        let from = (started - Duration::days(1)).format(ISO_DATE_FORMAT).to_string();
        let args: Vec<(String, String)> = [("status", "new"), ("row", "comments"), ("from_date", from.as_str())]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let now = Utc::now();
        let params = ReportParams::from_args(&args, Some("joe"), None, &config, now).unwrap();
        let (resolved, _) = resolve_tickets(&db.conn, "joe", &params.query, config.cache_ttl(), now).unwrap();
        let html = render_html(&build_report(&db.conn, &config, &params, &resolved).unwrap());

        assert!(html.contains("<tr class=\"comments\"><td colspan=\"5\">&lt;b&gt;fixed&lt;/b&gt; &amp; done</td></tr>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>") && !html.contains("<script>"));

        assert!(html.contains("<th><a href=\"/hours?status=new&amp;"));
        assert!(html.contains("&amp;order=seconds_worked\">Hours Worked</a></th>"));
        assert!(html.contains("&amp;order=worker\">Worker</a></th>"));
    }
}
