//! CSV and RSS renderings of hours reports.
//!
//! CSV exports start with a UTF-8 byte order mark so spreadsheet
//! applications pick the right encoding, followed by metadata rows (title,
//! link, filters, date range) and then the data. RSS feeds are RSS 2.0 with
//! one item per time entry.
//!
//! ```rust,no_run
//! use tickethours::libs::export::report_csv;
//! # fn run(report: &tickethours::libs::report::Report, config: &tickethours::libs::config::Config) -> tickethours::libs::error::Result<()> {
//! let bytes = report_csv(report, config)?;
//! std::fs::write("hours.csv", bytes)?;
//! # Ok(())
//! # }
//! ```

use crate::libs::config::Config;
use crate::libs::entry::TimeEntry;
use crate::libs::error::{HoursError, Result};
use crate::libs::formatter::{format_date, format_hours, format_hours_minutes, DATE_FORMAT, ISO_DATE_FORMAT};
use crate::libs::messages::Message;
use crate::libs::query::ConstraintSet;
use crate::libs::report::{Report, HOURS_PATH};
use crate::libs::ticket::Ticket;
use chrono::{DateTime, NaiveDate, Utc};
use csv::{Writer, WriterBuilder};

/// UTF-8 byte order mark written before CSV content.
pub const BOM: &[u8] = b"\xef\xbb\xbf";

fn csv_writer() -> Writer<Vec<u8>> {
    WriterBuilder::new().flexible(true).from_writer(BOM.to_vec())
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner().map_err(|e| HoursError::Io(e.into_error()))
}

/// An empty line. The writer itself would quote a lone empty field as `""`.
fn blank_line(wtr: &mut Writer<Vec<u8>>) -> Result<()> {
    let taken = std::mem::replace(wtr, WriterBuilder::new().flexible(true).from_writer(Vec::new()));
    let mut buf = finish(taken)?;
    buf.push(b'\n');
    *wtr = WriterBuilder::new().flexible(true).from_writer(buf);
    Ok(())
}

fn write_range(wtr: &mut Writer<Vec<u8>>, from: &DateTime<Utc>, to: &DateTime<Utc>) -> Result<()> {
    wtr.write_record(["From", "To"])?;
    wtr.write_record([format_date(from, DATE_FORMAT), format_date(to, DATE_FORMAT)])?;
    Ok(())
}

/// The timeline report as CSV. Without entries only the metadata rows are
/// written.
pub fn report_csv(report: &Report, config: &Config) -> Result<Vec<u8>> {
    let mut wtr = csv_writer();

    let title = match report.worker.worker() {
        Some(worker) => Message::HoursFor(worker.to_string()),
        None => Message::Hours,
    };
    wtr.write_record([title.to_string(), config.base_url.clone()])?;

    for (field, constraint) in report.constraints.iter() {
        if ConstraintSet::is_placeholder(field, constraint) {
            continue;
        }
        let mut row = vec![field.clone()];
        row.extend(constraint.values.iter().cloned());
        wtr.write_record(&row)?;
    }
    blank_line(&mut wtr)?;

    write_range(&mut wtr, &report.from, &report.to)?;
    blank_line(&mut wtr)?;

    for group in &report.groups {
        if !group.label.is_empty() {
            wtr.write_record([group.label.as_str()])?;
        }
        wtr.write_record(report.headers.iter().map(|h| h.label.as_str()))?;
        for row in &group.rows {
            wtr.write_record(report.columns.iter().map(|c| row.value(c)))?;
        }
        blank_line(&mut wtr)?;
    }

    finish(wtr)
}

/// All workers' hours, `Worker,Hours` sorted by worker.
pub fn users_csv(config: &Config, from: &DateTime<Utc>, to: &DateTime<Utc>, milestone: Option<&str>, hours: &[(String, i64)]) -> Result<Vec<u8>> {
    let mut wtr = csv_writer();
    wtr.write_record([Message::HoursForProject(config.project_name.clone()).to_string(), config.base_url.clone()])?;
    blank_line(&mut wtr)?;
    write_range(&mut wtr, from, to)?;
    if let Some(milestone) = milestone {
        wtr.write_record(["Milestone", milestone])?;
    }
    blank_line(&mut wtr)?;

    wtr.write_record(["Worker", "Hours"])?;
    for (worker, seconds) in hours {
        wtr.write_record([worker.clone(), format_hours(*seconds)])?;
    }
    finish(wtr)
}

/// One worker's hours, `Ticket,Hours` sorted by ticket.
pub fn user_csv(config: &Config, worker: &str, from: &DateTime<Utc>, to: &DateTime<Utc>, hours: &[(i64, i64)]) -> Result<Vec<u8>> {
    let rows: Vec<(String, i64)> = hours.iter().map(|(ticket, seconds)| (ticket.to_string(), *seconds)).collect();
    worker_csv(config, worker, from, to, "Ticket", &rows)
}

/// One worker's hours per day, `Date,Hours`.
pub fn user_dates_csv(config: &Config, worker: &str, from: &DateTime<Utc>, to: &DateTime<Utc>, hours: &[(NaiveDate, i64)]) -> Result<Vec<u8>> {
    let rows: Vec<(String, i64)> = hours
        .iter()
        .map(|(date, seconds)| (date.format(ISO_DATE_FORMAT).to_string(), *seconds))
        .collect();
    worker_csv(config, worker, from, to, "Date", &rows)
}

fn worker_csv(config: &Config, worker: &str, from: &DateTime<Utc>, to: &DateTime<Utc>, key: &str, rows: &[(String, i64)]) -> Result<Vec<u8>> {
    let mut wtr = csv_writer();
    wtr.write_record([Message::HoursFor(worker.to_string()).to_string(), config.base_url.clone()])?;
    blank_line(&mut wtr)?;
    write_range(&mut wtr, from, to)?;
    blank_line(&mut wtr)?;

    wtr.write_record([key, "Hours"])?;
    for (label, seconds) in rows {
        wtr.write_record([label.clone(), format_hours(*seconds)])?;
    }
    finish(wtr)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub guid: String,
    pub comments: String,
    pub pub_date: DateTime<Utc>,
}

impl RssItem {
    /// The feed item of one time entry.
    pub fn from_entry(entry: &TimeEntry, base_url: &str) -> Self {
        let title = Message::HoursWorkedBy {
            hours: format_hours_minutes(entry.seconds_worked),
            worker: entry.worker.clone(),
        }
        .to_string();
        let description = if entry.comments.is_empty() {
            title.clone()
        } else {
            format!("{}: {}", title, entry.comments)
        };
        let link = format!("{}{}/{}#{}", base_url, HOURS_PATH, entry.ticket, entry.id);

        RssItem {
            title,
            description,
            guid: link.clone(),
            link,
            comments: format!("{}/ticket/{}", base_url, entry.ticket),
            pub_date: entry.time_started,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RssChannel {
    pub title: String,
    pub description: String,
    pub link: String,
    pub items: Vec<RssItem>,
}

impl RssChannel {
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n");
        xml.push_str(&element("title", &self.title));
        xml.push_str(&element("description", &self.description));
        xml.push_str(&element("link", &self.link));
        for item in &self.items {
            xml.push_str("<item>\n");
            xml.push_str(&element("title", &item.title));
            xml.push_str(&element("description", &item.description));
            xml.push_str(&element("link", &item.link));
            xml.push_str(&format!("<guid isPermaLink=\"true\">{}</guid>\n", escape_xml(&item.guid)));
            xml.push_str(&element("comments", &item.comments));
            xml.push_str(&element("pubDate", &item.pub_date.to_rfc2822()));
            xml.push_str("</item>\n");
        }
        xml.push_str("</channel>\n</rss>\n");
        xml
    }
}

fn element(name: &str, text: &str) -> String {
    format!("<{0}>{1}</{0}>\n", name, escape_xml(text))
}

/// Escapes text for XML and HTML content and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Feed of every entry in the timeline report.
pub fn report_rss(report: &Report, config: &Config) -> String {
    let items = report
        .groups
        .iter()
        .flat_map(|g| g.rows.iter())
        .map(|row| RssItem::from_entry(&row.entry, &config.base_url))
        .collect();

    RssChannel {
        title: report.title.clone(),
        description: report.query_description.clone().filter(|d| !d.is_empty()).unwrap_or_else(|| report.title.clone()),
        link: format!("{}{}", config.base_url, HOURS_PATH),
        items,
    }
    .to_xml()
}

/// Feed of one ticket's entries, newest first.
pub fn ticket_rss(ticket: &Ticket, entries: &[TimeEntry], config: &Config) -> String {
    let mut entries: Vec<&TimeEntry> = entries.iter().collect();
    entries.sort_by(|a, b| b.time_started.cmp(&a.time_started));

    RssChannel {
        title: Message::HoursForTicket(ticket.id).to_string(),
        description: ticket.summary.clone(),
        link: format!("{}{}/{}", config.base_url, HOURS_PATH, ticket.id),
        items: entries.iter().map(|e| RssItem::from_entry(e, &config.base_url)).collect(),
    }
    .to_xml()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(comments: &str) -> TimeEntry {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        TimeEntry {
            id: 12,
            ticket: 7,
            worker: "joe".to_string(),
            submitter: "joe".to_string(),
            time_started: started,
            time_submitted: started,
            seconds_worked: 5400,
            comments: comments.to_string(),
        }
    }

    #[test]
    fn feed_item_links_back_to_the_ticket() {
        let item = RssItem::from_entry(&entry("fixed <it>"), "http://t");
        assert_eq!(item.title, "1:30 hours worked by joe");
        assert_eq!(item.description, "1:30 hours worked by joe: fixed <it>");
        assert_eq!(item.guid, "http://t/hours/7#12");
        assert_eq!(item.comments, "http://t/ticket/7");

        let xml = RssChannel { title: "t".into(), description: "d".into(), link: "l".into(), items: vec![item] }.to_xml();
        assert!(xml.contains("fixed &lt;it&gt;"));
        assert!(xml.contains("1 Mar 2024 09:00:00 +0000</pubDate>"));
    }

    #[test]
    fn feed_item_without_comment() {
        assert_eq!(RssItem::from_entry(&entry(""), "http://t").description, "1:30 hours worked by joe");
    }

    #[test]
    fn worker_csv_starts_with_bom() {
        let config = Config::default();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let bytes = user_csv(&config, "joe", &at, &at, &[(3, 5400)]).unwrap();
        assert!(bytes.starts_with(BOM));
        let text = String::from_utf8(bytes[BOM.len()..].to_vec()).unwrap();
        assert!(text.starts_with("Hours for joe,"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[lines.len() - 2..], ["Ticket,Hours", "3,1.50"]);
    }

    #[test]
    fn separator_lines_are_empty() {
        let mut config = Config::default();
        config.base_url = "http://t".to_string();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let bytes = user_dates_csv(&config, "joe", &at, &at, &[]).unwrap();
        let text = String::from_utf8(bytes[BOM.len()..].to_vec()).unwrap();

        assert!(!text.contains("\"\"\n"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[..3], ["Hours for joe,http://t", "", "From,To"]);
        assert_eq!(lines[4..], ["", "Date,Hours"]);
    }
}
