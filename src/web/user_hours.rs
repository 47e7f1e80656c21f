//! "Hours by User": everyone's totals over a range, and one worker's
//! totals per ticket or per day.

use super::component::{Component, Interface, RequestHandler};
use super::page::{Page, UserPage, UsersPage};
use super::request::{Content, Link, Request, Response};
use crate::db::tickets::Tickets;
use crate::libs::env::Env;
use crate::libs::error::Result;
use crate::libs::export::{user_csv, user_dates_csv, users_csv};
use crate::libs::formatter::ISO_DATE_FORMAT;
use crate::libs::permission::Capability;
use crate::libs::report::{href, optional_date};
use crate::libs::summary::{hours_by_date, hours_by_ticket, hours_by_worker, user_range, SummaryTotals};
use chrono::{DateTime, Duration, Utc};

const USER_PATH: &str = "/hours/user";

pub struct UserHoursModule;

impl Component for UserHoursModule {
    fn name(&self) -> &'static str {
        "UserHoursModule"
    }

    fn interfaces(&self) -> Vec<Interface> {
        vec![Interface::RequestHandler]
    }

    fn request_handler(&self) -> Option<&dyn RequestHandler> {
        Some(self)
    }
}

impl RequestHandler for UserHoursModule {
    fn match_request(&self, req: &Request) -> bool {
        let path = req.path();
        path == USER_PATH || path.starts_with("/hours/user/")
    }

    fn process_request(&self, env: &mut Env, req: &Request) -> Result<Response> {
        req.require(Capability::TicketViewHours)?;

        let (from, to) = user_range(optional_date(req.get_arg("from_date"))?, optional_date(req.get_arg("to_date"))?, Utc::now());
        match req.path().strip_prefix("/hours/user/").filter(|w| !w.is_empty()) {
            Some(worker) => self.user(env, req, worker, from, to),
            None => self.users(env, req, from, to),
        }
    }
}

/// The week before `from`, with the worker path kept.
fn prev_href(path: &str, from: DateTime<Utc>, extra: &[(String, String)]) -> String {
    let mut args = vec![
        ("from_date".to_string(), (from - Duration::days(7)).format(ISO_DATE_FORMAT).to_string()),
        ("to_date".to_string(), from.format(ISO_DATE_FORMAT).to_string()),
    ];
    args.extend_from_slice(extra);
    href(path, &args)
}

fn csv_href(path: &str, from: DateTime<Utc>, to: DateTime<Utc>, extra: &[(String, String)]) -> String {
    let mut args = vec![
        ("from_date".to_string(), from.format(ISO_DATE_FORMAT).to_string()),
        ("to_date".to_string(), to.format(ISO_DATE_FORMAT).to_string()),
    ];
    args.extend_from_slice(extra);
    args.push(("format".to_string(), "csv".to_string()));
    href(path, &args)
}

impl UserHoursModule {
    fn users(&self, env: &mut Env, req: &Request, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Response> {
        let milestone = req.get_arg("milestone").filter(|m| !m.is_empty());
        let worker_hours = hours_by_worker(&env.db.conn, from, to, milestone)?;

        if req.get_arg("format") == Some("csv") {
            return Ok(Response::new(Content::Csv(users_csv(&env.config, &from, &to, milestone, &worker_hours)?)));
        }

        let extra: Vec<(String, String)> = milestone.map(|m| ("milestone".to_string(), m.to_string())).into_iter().collect();
        let csv = csv_href(USER_PATH, from, to, &extra);
        Ok(Response::html(Page::Users(UsersPage {
            from,
            to,
            milestone: milestone.map(str::to_string),
            milestones: Tickets::new(&env.db.conn).milestones()?,
            worker_hours,
            prev_href: prev_href(USER_PATH, from, &extra),
        }))
        .link(Link::alternate(&csv, "CSV", "text/csv")))
    }

    fn user(&self, env: &mut Env, req: &Request, worker: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Response> {
        let path = format!("{}/{}", USER_PATH, worker);
        let by_date = req.get_arg("by") == Some("date");
        let extra: Vec<(String, String)> = if by_date {
            vec![("by".to_string(), "date".to_string())]
        } else {
            Vec::new()
        };

        let (tickets, dates, total_seconds) = if by_date {
            let dates = hours_by_date(&env.db.conn, worker, from, to)?;
            if req.get_arg("format") == Some("csv") {
                return Ok(Response::new(Content::Csv(user_dates_csv(&env.config, worker, &from, &to, &dates)?)));
            }
            let total = dates.total_seconds();
            (Vec::new(), dates, total)
        } else {
            let hours = hours_by_ticket(&env.db.conn, worker, from, to)?;
            if req.get_arg("format") == Some("csv") {
                return Ok(Response::new(Content::Csv(user_csv(&env.config, worker, &from, &to, &hours)?)));
            }
            let repo = Tickets::new(&env.db.conn);
            let mut tickets = Vec::with_capacity(hours.len());
            for (id, seconds) in &hours {
                let summary = repo.get(*id)?.map(|t| t.summary).unwrap_or_default();
                tickets.push((*id, summary, *seconds));
            }
            (tickets, Vec::new(), hours.total_seconds())
        };

        let csv = csv_href(&path, from, to, &extra);
        Ok(Response::html(Page::User(UserPage {
            worker: worker.to_string(),
            from,
            to,
            tickets,
            dates,
            total_seconds,
            prev_href: prev_href(&path, from, &extra),
        }))
        .link(Link::alternate(&csv, "CSV", "text/csv")))
    }
}
