//! The `/hours` pages: the timeline report, saved queries and the hours of
//! a single ticket. Also decorates the ticket page and vets estimates.

use super::component::{
    Component, FieldProblem, Interface, NavItem, NavigationContributor, PermissionRequestor, RequestHandler, TemplateFilter,
    TicketManipulator,
};
use super::page::{HostPage, Page, TicketHoursPage, TotalHoursField};
use super::request::{Content, Link, Method, Request, Response};
use super::ticket_change::TicketChange;
use crate::db::saved_queries::SavedQueries;
use crate::db::sessions::Sessions;
use crate::db::tickets::Tickets;
use crate::db::time_entries::TimeEntries;
use crate::libs::config::ANONYMOUS;
use crate::libs::entry::{EntryFilter, NewTimeEntry};
use crate::libs::env::Env;
use crate::libs::error::{HoursError, Result};
use crate::libs::export::{report_csv, report_rss, ticket_rss};
use crate::libs::formatter::{format_hours, local_date, parse_date, parse_decimal_hours, parse_hours_minutes, start_of_day, ISO_DATE_FORMAT};
use crate::libs::hours::Hours;
use crate::libs::messages::Message;
use crate::libs::permission::Capability;
use crate::libs::query::SavedQuery;
use crate::libs::report::{build_report, href, query_string, resolve_tickets, ReportParams, HOURS_PATH};
use crate::libs::ticket::ESTIMATED_HOURS;
use crate::{msg_debug, msg_warning};
use chrono::Utc;
use std::collections::BTreeMap;

const QUERY_PATH: &str = "/hours/query";

pub struct HoursModule;

impl Component for HoursModule {
    fn name(&self) -> &'static str {
        "HoursModule"
    }

    fn interfaces(&self) -> Vec<Interface> {
        vec![
            Interface::RequestHandler,
            Interface::NavigationContributor,
            Interface::TemplateFilter,
            Interface::TicketManipulator,
            Interface::PermissionRequestor,
        ]
    }

    fn request_handler(&self) -> Option<&dyn RequestHandler> {
        Some(self)
    }

    fn navigation_contributor(&self) -> Option<&dyn NavigationContributor> {
        Some(self)
    }

    fn template_filter(&self) -> Option<&dyn TemplateFilter> {
        Some(self)
    }

    fn ticket_manipulator(&self) -> Option<&dyn TicketManipulator> {
        Some(self)
    }

    fn permission_requestor(&self) -> Option<&dyn PermissionRequestor> {
        Some(self)
    }
}

/// The ticket id of a `/hours/<id>` path.
fn ticket_path(path: &str) -> Option<i64> {
    path.strip_prefix("/hours/")?.parse().ok()
}

impl RequestHandler for HoursModule {
    fn match_request(&self, req: &Request) -> bool {
        let path = req.path();
        path == HOURS_PATH || path.starts_with(QUERY_PATH) || ticket_path(path).is_some()
    }

    fn process_request(&self, env: &mut Env, req: &Request) -> Result<Response> {
        req.require(Capability::TicketViewHours)?;

        let path = req.path();
        if path.starts_with(QUERY_PATH) {
            return self.save_query(env, req);
        }
        match ticket_path(path) {
            Some(id) => self.ticket(env, req, id),
            None => self.timeline(env, req),
        }
    }
}

impl HoursModule {
    /// The report over all matching tickets, or a redirect to the query
    /// form when a query is being saved or edited.
    fn timeline(&self, env: &mut Env, req: &Request) -> Result<Response> {
        if req.has_arg("update") {
            Sessions::new(&env.db.conn).clear(req.sid())?;
        }

        let without = |skip: &[&str]| -> Vec<(String, String)> {
            req.args.iter().filter(|(k, _)| !skip.contains(&k.as_str())).cloned().collect()
        };
        if req.has_arg("save_query") {
            let args = without(&["save_query", "query_id", "action"]);
            return Ok(Response::redirect(&format!("{}?action=new&{}", QUERY_PATH, query_string(&args))));
        }
        if req.has_arg("edit_query") {
            let args = without(&["edit_query", "action"]);
            return Ok(Response::redirect(&format!("{}?action=edit&{}", QUERY_PATH, query_string(&args))));
        }

        let mut args = req.args.clone();
        if req.has_arg("delete_query") {
            req.require(Capability::TicketAddHours)?;
            if let Some(id) = req.get_arg("query_id").and_then(|id| id.trim().parse::<i64>().ok()) {
                SavedQueries::new(&env.db.conn).delete(id)?;
                msg_debug!(Message::QueryDeleted(id));
            }
            args = without(&["delete_query", "query_id"]);
        }

        req.require(Capability::TicketView)?;

        let now = Utc::now();
        let params = ReportParams::from_args(&args, req.authname.as_deref(), req.session_identity(), &env.config, now)?;
        let (resolved, _) = resolve_tickets(&env.db.conn, req.sid(), &params.query, env.config.cache_ttl(), now)?;
        let report = build_report(&env.db.conn, &env.config, &params, &resolved)?;

        match req.get_arg("format") {
            Some("rss") => return Ok(Response::new(Content::Rss(report_rss(&report, &env.config)))),
            Some("csv") => return Ok(Response::new(Content::Csv(report_csv(&report, &env.config)?))),
            _ => {}
        }

        let users_args = vec![
            ("from_date".to_string(), report.from.format(ISO_DATE_FORMAT).to_string()),
            ("to_date".to_string(), report.to.format(ISO_DATE_FORMAT).to_string()),
        ];
        let links = report.links.clone();
        Ok(Response::html(Page::Timeline(report))
            .link(Link::alternate(&links.rss, "RSS Feed", "application/rss+xml"))
            .link(Link::alternate(&links.csv, "Comma-delimited Text", "text/csv"))
            .link(Link::new("prev", &links.prev, "Prev Week"))
            .link(Link::new("next", &links.next, "Next Week"))
            .ctxtnav(Link::new("nav", &href("/hours/user", &users_args), "Hours by User"))
            .ctxtnav(Link::new("nav", &format!("{}/list", QUERY_PATH), "Saved Queries")))
    }

    /// Saved query list, form, and storage.
    fn save_query(&self, env: &mut Env, req: &Request) -> Result<Response> {
        let queries = SavedQueries::new(&env.db.conn);

        if req.method == Method::Post {
            req.require(Capability::TicketAddHours)?;
            let id = req.get_arg("id").and_then(|id| id.trim().parse::<i64>().ok()).unwrap_or(0);
            let mut query = SavedQuery::new(
                req.get_arg("title").unwrap_or_default(),
                req.get_arg("description").unwrap_or_default(),
                req.get_arg("query").unwrap_or_default(),
            );
            query.id = id;
            let id = if id == 0 {
                queries.insert(&query)?.id
            } else {
                queries.update(&query)?;
                id
            };
            msg_debug!(Message::QuerySaved(id));
            return Ok(Response::redirect(&format!("{}?query_id={}&{}", HOURS_PATH, id, query.query)));
        }

        match req.get_arg("action") {
            Some("new") => {
                let args: Vec<(String, String)> = req.args.iter().filter(|(k, _)| k != "action").cloned().collect();
                Ok(Response::html(Page::QueryForm(SavedQuery::new("", "", &query_string(&args)))))
            }
            Some("edit") => {
                let value = req.get_arg("query_id").unwrap_or_default();
                let id = value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| HoursError::validation(Message::QueryIdNotInteger(value.to_string())))?;
                Ok(Response::html(Page::QueryForm(queries.get(id)?)))
            }
            _ => Ok(Response::html(Page::Queries(queries.list()?))),
        }
    }

    fn ticket(&self, env: &mut Env, req: &Request, id: i64) -> Result<Response> {
        let ticket = Tickets::new(&env.db.conn).require(id)?;

        if req.method == Method::Post {
            if req.has_arg("addhours") {
                return self.do_ticket_change(env, req, id);
            }
            if req.has_arg("edithours") {
                return self.edit_ticket_hours(env, req, id);
            }
        }

        let mut entries = TimeEntries::new(&env.db.conn).fetch(&EntryFilter::new(id))?;
        entries.sort_by(|a, b| b.time_started.cmp(&a.time_started));

        if req.get_arg("format") == Some("rss") {
            return Ok(Response::new(Content::Rss(ticket_rss(&ticket, &entries, &env.config))));
        }

        let total_seconds = entries.iter().map(|e| e.seconds_worked).sum();
        let rss = href(&format!("{}/{}", HOURS_PATH, id), &[("format".to_string(), "rss".to_string())]);
        Ok(Response::html(Page::TicketHours(TicketHoursPage {
            ticket,
            entries,
            total_seconds,
            can_add_hours: req.perm.has(Capability::TicketAddHours),
            can_add_others_hours: req.perm.has(Capability::TracAdmin),
        }))
        .link(Link::alternate(&rss, "RSS Feed", "application/rss+xml"))
        .ctxtnav(Link::new("up", &format!("/ticket/{}", id), &format!("Back to Ticket #{}", id))))
    }

    /// Records hours from the ticket hours form.
    fn do_ticket_change(&self, env: &mut Env, req: &Request, id: i64) -> Result<Response> {
        req.require(Capability::TicketAddHours)?;
        let location = req.path_info.clone();

        let logged_in = req.authname.as_deref().unwrap_or(ANONYMOUS);
        let worker = req.get_arg("worker").filter(|w| !w.is_empty()).unwrap_or(logged_in);
        if worker != logged_in {
            req.require(Capability::TicketAdmin)?;
        }

        let now = Utc::now();
        let started = match req.get_arg("date").filter(|d| !d.is_empty()) {
            Some(value) => {
                let Ok(date) = parse_date(value) else {
                    let message = Message::InvalidDate(value.to_string());
                    msg_warning!(message);
                    return Ok(Response::redirect(&location).warning(message));
                };
                if date == local_date(&now) {
                    now
                } else {
                    start_of_day(date)
                }
            }
            None => now,
        };

        let seconds = match parse_hours_minutes(req.get_arg("hours").unwrap_or("0:00")) {
            Ok(seconds) => seconds,
            Err(_) => {
                msg_warning!(Message::InvalidHours);
                return Ok(Response::redirect(&location).warning(Message::InvalidHours));
            }
        };
        let comments = req.get_arg("comments").unwrap_or_default().trim();

        Hours::new(&mut env.db).record_work(
            NewTimeEntry::new(id, worker, seconds)
                .submitter(Some(logged_in))
                .started(Some(started))
                .comments(Some(comments)),
        )?;

        if !comments.is_empty() {
            let note = Message::HoursLoggedComment {
                url: format!("{}/{}", HOURS_PATH, id),
                hours: format_hours(seconds),
                worker: worker.to_string(),
                comments: comments.to_string(),
            };
            Tickets::new(&env.db.conn).add_comment(id, logged_in, &note.to_string())?;
        }

        Ok(Response::redirect(&location))
    }

    /// Applies `hours_<id>=H:MM` and `rm_<id>` arguments to the ticket's
    /// entries.
    fn edit_ticket_hours(&self, env: &mut Env, req: &Request, id: i64) -> Result<Response> {
        req.require(Capability::TicketAddHours)?;
        let location = req.path_info.clone();

        let mut edits = BTreeMap::new();
        for (key, value) in &req.args {
            if let Some(entry) = key.strip_prefix("hours_").and_then(|e| e.parse::<i64>().ok()) {
                match parse_hours_minutes(value) {
                    Ok(seconds) => {
                        edits.entry(entry).or_insert(seconds);
                    }
                    Err(_) => return Ok(Response::redirect(&location).warning(Message::InvalidHours)),
                }
            }
        }
        for key in req.args.iter().map(|(k, _)| k) {
            if let Some(entry) = key.strip_prefix("rm_").and_then(|e| e.parse::<i64>().ok()) {
                edits.insert(entry, 0);
            }
        }

        let actor = req.authname.as_deref().unwrap_or(ANONYMOUS);
        let summary = Hours::new(&mut env.db).edit_work(id, &edits, actor, &req.perm)?;
        msg_debug!(Message::HoursUpdated(summary.updated));
        msg_debug!(Message::HoursRemoved(summary.removed));

        Ok(Response::redirect(&location))
    }
}

impl NavigationContributor for HoursModule {
    fn active_navigation_item(&self, _req: &Request) -> &str {
        "hours"
    }

    fn navigation_items(&self, req: &Request) -> Vec<NavItem> {
        if !req.perm.has(Capability::TicketViewHours) {
            return Vec::new();
        }
        vec![NavItem {
            category: "mainnav".to_string(),
            name: "hours".to_string(),
            link: Link::new("nav", HOURS_PATH, "Hours"),
        }]
    }
}

impl PermissionRequestor for HoursModule {
    fn permission_actions(&self) -> Vec<Capability> {
        vec![Capability::TicketAddHours, Capability::TicketViewHours]
    }
}

impl TicketManipulator for HoursModule {
    /// Estimated hours must be a non-negative number; blank means zero.
    fn validate_ticket(&self, _env: &mut Env, _req: &Request, change: &mut TicketChange) -> Result<Vec<FieldProblem>> {
        let field = Some(ESTIMATED_HOURS.to_string());
        let Some(value) = change.value(ESTIMATED_HOURS) else {
            return Ok(vec![(field, Message::EstimatedHoursNotDefined)]);
        };

        if value.trim().is_empty() {
            change.fields.insert(ESTIMATED_HOURS.to_string(), "0".to_string());
            return Ok(Vec::new());
        }
        match parse_decimal_hours(&value) {
            None => Ok(vec![(field, Message::EstimatedHoursNotANumber)]),
            Some(hours) if hours < 0.0 => Ok(vec![(field, Message::EstimatedHoursNegative)]),
            Some(_) => Ok(Vec::new()),
        }
    }
}

impl TemplateFilter for HoursModule {
    /// Links the ticket's `totalhours` field to its hours page.
    fn filter_page(&self, env: &mut Env, req: &Request, page: &mut HostPage) -> Result<()> {
        let HostPage::Ticket { ticket, total_hours } = page else {
            return Ok(());
        };
        if !req.perm.has(Capability::TicketViewHours) {
            return Ok(());
        }

        let Some(ticket) = ticket else {
            *total_hours = Some(TotalHoursField {
                hours: "0".to_string(),
                href: String::new(),
                with_children: None,
            });
            return Ok(());
        };

        let hours = Hours::new(&mut env.db);
        let with_children = if env.config.relations {
            Some(format_hours(hours.total_seconds_with_children(ticket.id)?))
        } else {
            None
        };
        *total_hours = Some(TotalHoursField {
            hours: format_hours(hours.total_seconds_for_ticket(ticket.id)?),
            href: format!("{}/{}", HOURS_PATH, ticket.id),
            with_children,
        });
        Ok(())
    }
}
