//! The `/hours` timeline report.
//!
//! A report request names a ticket query, a date range and a worker filter.
//! The ticket query is resolved (through the session cache), the time
//! entries of the matching tickets are fetched for the range, and the
//! entries are laid out in groups with per-group totals.
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use tickethours::db::db::Db;
//! use tickethours::libs::config::Config;
//! use tickethours::libs::report::{build_report, resolve_tickets, ReportParams};
//!
//! let db = Db::new()?;
//! let config = Config::default();
//! let args = vec![("group".to_string(), "worker".to_string())];
//! let params = ReportParams::from_args(&args, Some("joe"), None, &config, Utc::now())?;
//! let (tickets, _) = resolve_tickets(&db.conn, "joe", &params.query, config.cache_ttl(), Utc::now())?;
//! let report = build_report(&db.conn, &config, &params, &tickets)?;
//! println!("{} entries", report.num_items);
//! # Ok::<(), tickethours::libs::error::HoursError>(())
//! ```

use crate::db::saved_queries::SavedQueries;
use crate::db::sessions::Sessions;
use crate::db::tickets::{ResolvedTickets, Tickets};
use crate::db::time_entries::TimeEntries;
use crate::libs::config::Config;
use crate::libs::entry::{EntryFilter, TimeEntry, WorkerFilter};
use crate::libs::error::Result;
use crate::libs::formatter::{end_of_day, format_date, format_hours, local_date, parse_date, start_of_day, DATE_FORMAT, ISO_DATE_FORMAT};
use crate::libs::messages::Message;
use crate::libs::query::{ConstraintSet, TicketQuery};
use crate::libs::session::QueryCache;
use crate::libs::ticket::{is_ticket_field, Ticket};
use crate::msg_debug;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::Connection;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Columns shown when the request names none.
pub const DEFAULT_COLUMNS: &[&str] = &["id", "summary", "time_started", "seconds_worked", "worker"];

/// Time-entry columns and their labels.
pub const TIME_ENTRY_LABELS: &[(&str, &str)] = &[
    ("id", "Ticket"),
    ("seconds_worked", "Hours Worked"),
    ("worker", "Worker"),
    ("submitter", "Work submitted by"),
    ("time_started", "Work done on"),
    ("time_submitted", "Work recorded on"),
];

/// Path of the timeline report.
pub const HOURS_PATH: &str = "/hours";

/// Label of a report column.
pub fn column_label(column: &str) -> String {
    if let Some((_, label)) = TIME_ENTRY_LABELS.iter().find(|(name, _)| *name == column) {
        return label.to_string();
    }
    let mut chars = column.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}

/// A column that belongs to the time entry rather than the ticket.
fn is_entry_column(column: &str) -> bool {
    column != "id" && TIME_ENTRY_LABELS.iter().any(|(name, _)| *name == column)
}

/// How report rows are split into groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    /// A native ticket field, grouped by the ticket query.
    Native(String),
    Ticket,
    Worker,
    /// The local calendar date work started on.
    Date,
}

impl Grouping {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" => None,
            "ticket" | "id" => Some(Grouping::Ticket),
            "worker" => Some(Grouping::Worker),
            "date" => Some(Grouping::Date),
            field => Some(Grouping::Native(field.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Grouping::Native(field) => field,
            Grouping::Ticket => "ticket",
            Grouping::Worker => "worker",
            Grouping::Date => "date",
        }
    }

    /// Groupings that can place one ticket in several groups, so its
    /// estimate may be summed more than once across the report.
    pub fn warns(&self) -> bool {
        matches!(self, Grouping::Worker | Grouping::Date)
    }
}

/// Everything a report request asks for.
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub query: TicketQuery,
    pub columns: Vec<String>,
    /// Entry field the rows of each group are sorted on.
    pub order: Option<String>,
    pub desc: bool,
    pub grouping: Option<Grouping>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// The range was given explicitly and is carried in links.
    pub explicit_range: bool,
    pub worker: WorkerFilter,
    pub show_comments: bool,
    pub query_id: Option<i64>,
    /// Problems with the request that did not stop the report.
    pub warnings: Vec<Message>,
}

impl ReportParams {
    /// Reads report parameters from request arguments.
    ///
    /// `authname` is the authenticated viewer, `identity` a fallback name
    /// (session email or name) for anonymous viewers; either replaces
    /// `$USER` in the default query.
    pub fn from_args(
        args: &[(String, String)],
        authname: Option<&str>,
        identity: Option<&str>,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let get = |key: &str| args.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        let flag = |key: &str| get(key).is_some_and(|v| v != "0");
        let all = |key: &str| args.iter().filter(|(k, _)| k == key).map(|(_, v)| v.clone()).collect::<Vec<_>>();

        let mut warnings = Vec::new();

        let mut constraints = ConstraintSet::from_args(&without_removed_filters(args), is_ticket_field);
        if constraints.is_empty() && get("order").is_none() {
            constraints = ConstraintSet::parse(&config.default_query)?;
            constraints.substitute_user(authname.or(identity));
            msg_debug!(Message::DefaultQueryUsed(constraints.to_string()));
        }

        let mut columns = all("col");
        if columns.is_empty() {
            columns = DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect();
        }
        if !columns.iter().any(|c| c == "id") {
            columns.insert(0, "id".to_string());
        }

        let order = get("order").filter(|o| !o.is_empty()).map(str::to_string);
        let desc = flag("desc");
        let grouping = get("group").and_then(Grouping::parse);

        let mut query = TicketQuery::new(constraints);
        query.order = order.clone().filter(|o| !is_entry_column(o));
        query.desc = desc && query.order.is_some();
        if let Some(Grouping::Native(field)) = &grouping {
            query.group = Some(field.clone());
            query.groupdesc = flag("groupdesc");
        }
        query.page = get("page").and_then(|p| p.parse().ok()).filter(|p| *p > 0).unwrap_or(1);
        query.max = get("max").and_then(|m| m.parse().ok()).unwrap_or(0);

        let from = match get("from_date").filter(|d| !d.is_empty()) {
            Some(date) => start_of_day(parse_date(date)?),
            None => start_of_day(local_date(&now)),
        };
        let to = match get("to_date").filter(|d| !d.is_empty()) {
            Some(date) => end_of_day(parse_date(date)?),
            None => now,
        };

        let worker = match get("worker_filter") {
            Some(value) => WorkerFilter::parse(value),
            None => authname.map(|name| WorkerFilter::Worker(name.to_string())).unwrap_or_default(),
        };

        let query_id = match get("query_id").filter(|q| !q.is_empty()) {
            Some(value) => match value.trim().parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warnings.push(Message::QueryIdNotInteger(value.to_string()));
                    None
                }
            },
            None => None,
        };

        Ok(ReportParams {
            query,
            columns,
            order: order.filter(|o| is_entry_column(o)),
            desc,
            grouping,
            from,
            to,
            explicit_range: get("from_date").is_some(),
            worker,
            show_comments: all("row").iter().any(|r| r == "comments"),
            query_id,
            warnings,
        })
    }

    /// Arguments reproducing this report.
    pub fn link_args(&self) -> Vec<(String, String)> {
        let mut args = self.query.constraints.to_args();

        let order = self.order.as_ref().or(self.query.order.as_ref());
        if let Some(order) = order {
            args.push(("order".to_string(), order.clone()));
            if self.desc {
                args.push(("desc".to_string(), "1".to_string()));
            }
        }
        if let Some(grouping) = &self.grouping {
            args.push(("group".to_string(), grouping.name().to_string()));
            if self.query.groupdesc {
                args.push(("groupdesc".to_string(), "1".to_string()));
            }
        }
        for column in &self.columns {
            args.push(("col".to_string(), column.clone()));
        }
        if self.show_comments {
            args.push(("row".to_string(), "comments".to_string()));
        }
        if let Some(worker) = self.worker.worker() {
            args.push(("worker_filter".to_string(), worker.to_string()));
        }
        if self.explicit_range {
            args.push(("from_date".to_string(), format_date(&self.from, ISO_DATE_FORMAT)));
            args.push(("to_date".to_string(), format_date(&self.to, ISO_DATE_FORMAT)));
        }
        if let Some(id) = self.query_id {
            args.push(("query_id".to_string(), id.to_string()));
        }
        args
    }

    /// Link to this report sorted on `column`, toggling the direction when
    /// it is already the active column.
    pub fn sort_href(&self, column: &str) -> String {
        let active = self.order.as_deref().or(self.query.order.as_deref()) == Some(column);
        let mut args: Vec<(String, String)> = self.link_args().into_iter().filter(|(k, _)| k != "order" && k != "desc").collect();
        args.push(("order".to_string(), column.to_string()));
        if active && !self.desc {
            args.push(("desc".to_string(), "1".to_string()));
        }
        href(HOURS_PATH, &args)
    }

    /// Link to this report over another date range.
    pub fn range_href(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> String {
        let mut args: Vec<(String, String)> = self.link_args().into_iter().filter(|(k, _)| k != "from_date" && k != "to_date").collect();
        args.push(("from_date".to_string(), format_date(&from, ISO_DATE_FORMAT)));
        args.push(("to_date".to_string(), format_date(&to, ISO_DATE_FORMAT)));
        href(HOURS_PATH, &args)
    }

    pub fn format_href(&self, format: &str) -> String {
        let mut args = self.link_args();
        args.push(("format".to_string(), format.to_string()));
        href(HOURS_PATH, &args)
    }
}

/// Drops the values named by a `rm_filter_<field>[_<index>]` argument.
fn without_removed_filters(args: &[(String, String)]) -> Vec<(String, String)> {
    let Some(target) = args.iter().find_map(|(k, _)| k.strip_prefix("rm_filter_")) else {
        return args.to_vec();
    };
    let (field, index) = match target.rsplit_once('_') {
        Some((field, index)) if !field.is_empty() && index.chars().all(|c| c.is_ascii_digit()) => (field, index.parse::<usize>().ok()),
        _ => (target, None),
    };

    let mut seen = 0;
    args.iter()
        .filter(|(k, _)| {
            if k != field {
                return true;
            }
            let keep = matches!(index, Some(i) if i != seen);
            seen += 1;
            keep
        })
        .cloned()
        .collect()
}

/// `path?k=v&...` with every key and value percent-encoded.
pub fn href(path: &str, args: &[(String, String)]) -> String {
    if args.is_empty() {
        return path.to_string();
    }
    format!("{}?{}", path, query_string(args))
}

/// Joins pairs into an encoded `k=v&...` string.
pub fn query_string(args: &[(String, String)]) -> String {
    args.iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// One time entry with the ticket it was logged against.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub entry: TimeEntry,
    pub ticket: Ticket,
}

impl ReportRow {
    /// Display value of a column.
    pub fn value(&self, column: &str) -> String {
        match column {
            "id" | "ticket" => self.ticket.id.to_string(),
            "seconds_worked" => format_hours(self.entry.seconds_worked),
            "worker" => self.entry.worker.clone(),
            "submitter" => self.entry.submitter.clone(),
            "time_started" => format_date(&self.entry.time_started, DATE_FORMAT),
            "time_submitted" => format_date(&self.entry.time_submitted, DATE_FORMAT),
            "comments" => self.entry.comments.clone(),
            field => self.ticket.field(field).unwrap_or_default(),
        }
    }

    fn compare_entry(&self, other: &ReportRow, column: &str) -> Ordering {
        let (a, b) = (&self.entry, &other.entry);
        match column {
            "seconds_worked" => a.seconds_worked.cmp(&b.seconds_worked),
            "worker" => a.worker.cmp(&b.worker),
            "submitter" => a.submitter.cmp(&b.submitter),
            "time_started" => a.time_started.cmp(&b.time_started),
            "time_submitted" => a.time_submitted.cmp(&b.time_submitted),
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct ReportGroup {
    /// Empty when the report is not grouped.
    pub label: String,
    pub rows: Vec<ReportRow>,
    pub total_seconds: i64,
    /// Estimates of the distinct tickets in the group.
    pub estimated_seconds: i64,
}

impl ReportGroup {
    fn new(label: String, rows: Vec<ReportRow>) -> Self {
        let total_seconds = rows.iter().map(|r| r.entry.seconds_worked).sum();

        let mut seen = BTreeSet::new();
        let estimated_hours: f64 = rows
            .iter()
            .filter(|r| seen.insert(r.ticket.id))
            .map(|r| r.ticket.estimated_hours())
            .sum();

        ReportGroup {
            label,
            rows,
            total_seconds,
            estimated_seconds: (estimated_hours * 3600.0).round() as i64,
        }
    }

    pub fn total_hours(&self) -> String {
        format_hours(self.total_seconds)
    }

    pub fn estimated_hours(&self) -> String {
        format_hours(self.estimated_seconds)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportLinks {
    pub prev: String,
    pub next: String,
    pub rss: String,
    pub csv: String,
}

/// View-model of the timeline report.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub project: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub worker: WorkerFilter,
    pub constraints: ConstraintSet,
    pub columns: Vec<String>,
    pub headers: Vec<Header>,
    pub groups: Vec<ReportGroup>,
    pub warnings: Vec<Message>,
    pub links: ReportLinks,
    pub query_title: Option<String>,
    pub query_description: Option<String>,
    pub num_items: usize,
    pub show_comments: bool,
}

/// Resolves a ticket query, reusing the session's cached ticket list while
/// it is fresh for the same constraints. The second value tells whether
/// the cache was used.
pub fn resolve_tickets(conn: &Connection, sid: &str, query: &TicketQuery, ttl: Duration, now: DateTime<Utc>) -> Result<(ResolvedTickets, bool)> {
    let sessions = Sessions::new(conn);
    let tickets = Tickets::new(conn);
    let key = query.constraints.to_string();

    if let Some(cache) = sessions.get(sid)?.filter(|c| c.is_fresh(&key, now, ttl)) {
        msg_debug!(Message::QueryCacheHit(cache.tickets.len()));
        return Ok((tickets.resolve(query, Some(&cache.tickets))?, true));
    }

    let mut unpaged = query.clone();
    unpaged.group = None;
    unpaged.max = 0;
    unpaged.page = 1;
    let ids = tickets.resolve(&unpaged, None)?.ids();

    msg_debug!(Message::QueryCacheRefreshed(ids.len()));
    sessions.save(sid, &QueryCache::new(key, now, ids.clone()))?;

    Ok((tickets.resolve(query, Some(&ids))?, false))
}

/// Builds the report for already resolved tickets.
pub fn build_report(conn: &Connection, config: &Config, params: &ReportParams, resolved: &ResolvedTickets) -> Result<Report> {
    let filter = EntryFilter::new(resolved.ids())
        .between(Some(params.from), Some(params.to))
        .worker(params.worker.clone());
    let entries = TimeEntries::new(conn).fetch(&filter)?;

    let mut by_ticket: HashMap<i64, Vec<TimeEntry>> = HashMap::new();
    for entry in entries {
        by_ticket.entry(entry.ticket).or_default().push(entry);
    }

    let mut groups: Vec<(String, Vec<ReportRow>)> = Vec::new();
    for (label, tickets) in &resolved.groups {
        let mut rows: Vec<ReportRow> = tickets
            .iter()
            .flat_map(|ticket| {
                by_ticket.get(&ticket.id).into_iter().flatten().map(move |entry| ReportRow {
                    entry: entry.clone(),
                    ticket: ticket.clone(),
                })
            })
            .collect();

        if let Some(order) = params.order.as_deref() {
            if params.desc {
                rows.sort_by(|a, b| b.compare_entry(a, order));
            } else {
                rows.sort_by(|a, b| a.compare_entry(b, order));
            }
        }
        if !rows.is_empty() {
            groups.push((label.clone(), rows));
        }
    }

    let mut warnings = params.warnings.clone();
    if let Some(grouping) = params.grouping.as_ref().filter(|g| !matches!(g, Grouping::Native(_))) {
        if grouping.warns() {
            warnings.push(Message::DoubleCountWarning);
        }
        let rows: Vec<ReportRow> = groups.into_iter().flat_map(|(_, rows)| rows).collect();
        groups = match grouping {
            Grouping::Worker => regroup(rows, |r| r.entry.worker.clone(), |w: &String| w.clone()),
            Grouping::Date => regroup(rows, |r| local_date(&r.entry.time_started), |d| d.format(ISO_DATE_FORMAT).to_string()),
            _ => regroup(rows, |r| r.ticket.id, |id| id.to_string()),
        };
    }

    let (query_title, query_description) = match params.query_id {
        Some(id) => {
            let saved = SavedQueries::new(conn).get(id)?;
            (Some(saved.title), Some(saved.description))
        }
        None => (None, None),
    };

    let headers = params
        .columns
        .iter()
        .map(|column| Header {
            name: column.clone(),
            label: column_label(column),
            href: params.sort_href(column),
        })
        .collect();

    let links = ReportLinks {
        prev: params.range_href(params.from - Duration::days(7), params.from),
        next: params.range_href(params.to, params.to + Duration::days(7)),
        rss: href(HOURS_PATH, &[("format".to_string(), "rss".to_string())]),
        csv: params.format_href("csv"),
    };

    let groups: Vec<ReportGroup> = groups.into_iter().map(|(label, rows)| ReportGroup::new(label, rows)).collect();
    let num_items = groups.iter().map(|g| g.rows.len()).sum();

    Ok(Report {
        title: Message::ReportTitle {
            project: config.project_name.clone(),
            from: format_date(&params.from, DATE_FORMAT),
            to: format_date(&params.to, DATE_FORMAT),
        }
        .to_string(),
        project: config.project_name.clone(),
        from: params.from,
        to: params.to,
        worker: params.worker.clone(),
        constraints: params.query.constraints.clone(),
        columns: params.columns.clone(),
        headers,
        groups,
        warnings,
        links,
        query_title,
        query_description,
        num_items,
        show_comments: params.show_comments,
    })
}

/// Splits rows by a key, groups ordered by key, rows keeping their order.
fn regroup<K: Ord>(rows: Vec<ReportRow>, key: impl Fn(&ReportRow) -> K, label: impl Fn(&K) -> String) -> Vec<(String, Vec<ReportRow>)> {
    let mut grouped: BTreeMap<K, Vec<ReportRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(key(&row)).or_default().push(row);
    }
    grouped.into_iter().map(|(k, rows)| (label(&k), rows)).collect()
}

/// Parses an optional `YYYY-MM-DD` argument, `None` when absent or blank.
pub fn optional_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_date(value).map(Some),
        None => Ok(None),
    }
}

impl Report {
    /// An error-free empty report has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    pub fn total_seconds(&self) -> i64 {
        self.groups.iter().map(|g| g.total_seconds).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db::Db;
    use crate::libs::hours::Hours;
    use crate::libs::entry::NewTimeEntry;
    use crate::libs::ticket::NewTicket;

    fn args(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn yesterday() -> String {
        (local_date(&Utc::now()) - Duration::days(1)).format(ISO_DATE_FORMAT).to_string()
    }

    #[test]
    fn defaults_apply_without_constraints() {
        let now = Utc::now();
        let params = ReportParams::from_args(&[], Some("joe"), None, &Config::default(), now).unwrap();
        assert_eq!(params.query.constraints.to_string(), "status!=bogus");
        assert_eq!(params.columns, DEFAULT_COLUMNS);
        assert_eq!(params.worker, WorkerFilter::Worker("joe".to_string()));
        assert_eq!(params.to, now);
        assert_eq!(params.from, start_of_day(local_date(&now)));

        let anonymous = ReportParams::from_args(&[], None, None, &Config::default(), now).unwrap();
        assert_eq!(anonymous.worker, WorkerFilter::Any);
    }

    #[test]
    fn default_query_drops_user_clauses_for_anonymous_viewers() {
        let mut config = Config::default();
        config.default_query = "owner=$USER&status!=closed".to_string();
        let now = Utc::now();

        let anonymous = ReportParams::from_args(&[], None, None, &config, now).unwrap();
        assert_eq!(anonymous.query.constraints.to_string(), "status!=closed");

        let by_email = ReportParams::from_args(&[], None, Some("ann@example.com"), &config, now).unwrap();
        assert_eq!(by_email.query.constraints.to_string(), "owner=ann@example.com&status!=closed");
    }

    #[test]
    fn entry_columns_order_rows_not_tickets() {
        let params = ReportParams::from_args(
            &args(&[("order", "seconds_worked"), ("desc", "1"), ("milestone", "m1")]),
            None,
            None,
            &Config::default(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(params.query.order, None);
        assert_eq!(params.order.as_deref(), Some("seconds_worked"));
        assert!(params.desc);
        assert!(params.sort_href("seconds_worked").contains("order=seconds_worked"));
        assert!(!params.sort_href("seconds_worked").contains("desc=1"));
        assert!(!params.sort_href("worker").contains("desc=1"));
    }

    #[test]
    fn removed_filters_leave_the_rest() {
        let filtered = without_removed_filters(&args(&[("owner", "a"), ("owner", "b"), ("status", "new"), ("rm_filter_owner_0", "-")]));
        assert_eq!(filtered, args(&[("owner", "b"), ("status", "new"), ("rm_filter_owner_0", "-")]));

        let filtered = without_removed_filters(&args(&[("owner", "a"), ("status", "new"), ("rm_filter_owner", "-")]));
        assert_eq!(filtered, args(&[("status", "new"), ("rm_filter_owner", "-")]));
    }

    #[test]
    fn malformed_query_id_is_a_warning() {
        let params = ReportParams::from_args(&args(&[("query_id", "abc")]), None, None, &Config::default(), Utc::now()).unwrap();
        assert_eq!(params.query_id, None);
        assert_eq!(params.warnings, vec![Message::QueryIdNotInteger("abc".to_string())]);
    }

    #[test]
    fn worker_grouping_counts_each_estimate_once() {
        let mut db = Db::open_in_memory().unwrap();
        let (a, b) = {
            let tickets = Tickets::new(&db.conn);
            let mut new = NewTicket::new("a", "joe");
            new.estimated_hours = Some("2".to_string());
            let a = tickets.create(&new).unwrap().id;
            new.estimated_hours = Some("1.5".to_string());
            let b = tickets.create(&new).unwrap().id;
            (a, b)
        };

        let started = Utc::now() - Duration::hours(1);
        let mut hours = Hours::new(&mut db);
        for (ticket, worker, seconds) in [(a, "joe", 3600), (a, "joe", 1800), (b, "joe", 900), (a, "ann", 600)] {
            hours.record_work(NewTimeEntry::new(ticket, worker, seconds).started(Some(started))).unwrap();
        }

        let config = Config::default();
        let params = ReportParams::from_args(
            &args(&[("group", "worker"), ("worker_filter", "*any"), ("status", "new"), ("from_date", yesterday().as_str())]),
            Some("joe"),
            None,
            &config,
            Utc::now(),
        )
        .unwrap();
        let (resolved, cached) = resolve_tickets(&db.conn, "joe", &params.query, config.cache_ttl(), Utc::now()).unwrap();
        assert!(!cached);

        let report = build_report(&db.conn, &config, &params, &resolved).unwrap();
        assert_eq!(report.warnings, vec![Message::DoubleCountWarning]);
        assert_eq!(report.groups.iter().map(|g| g.label.as_str()).collect::<Vec<_>>(), vec!["ann", "joe"]);

        let joe = &report.groups[1];
        assert_eq!(joe.total_seconds, 6300);
        assert_eq!(joe.estimated_hours(), "3.50");
        assert_eq!(report.groups[0].estimated_hours(), "2.00");
        assert_eq!(report.num_items, 4);
    }

    #[test]
    fn ticket_grouping_has_no_warning() {
        let mut db = Db::open_in_memory().unwrap();
        let id = Tickets::new(&db.conn).create(&NewTicket::new("a", "joe")).unwrap().id;
        Hours::new(&mut db)
            .record_work(NewTimeEntry::new(id, "joe", 60).started(Some(Utc::now() - Duration::minutes(5))))
            .unwrap();

        let config = Config::default();
        let params =
            ReportParams::from_args(&args(&[("group", "ticket"), ("from_date", yesterday().as_str())]), Some("joe"), None, &config, Utc::now())
                .unwrap();
        let (resolved, _) = resolve_tickets(&db.conn, "joe", &params.query, config.cache_ttl(), Utc::now()).unwrap();
        let report = build_report(&db.conn, &config, &params, &resolved).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(report.groups[0].label, id.to_string());
    }
}
