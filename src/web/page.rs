//! View-models handed back to the caller for rendering.

use crate::libs::entry::TimeEntry;
use crate::libs::query::SavedQuery;
use crate::libs::report::Report;
use crate::libs::summary::MilestoneHours;
use crate::libs::ticket::{Milestone, Ticket};
use chrono::{DateTime, NaiveDate, Utc};

/// Pages rendered by the hours request handlers.
#[derive(Debug, Clone)]
pub enum Page {
    Timeline(Report),
    TicketHours(TicketHoursPage),
    Queries(Vec<SavedQuery>),
    QueryForm(SavedQuery),
    Users(UsersPage),
    User(UserPage),
}

#[derive(Debug, Clone)]
pub struct TicketHoursPage {
    pub ticket: Ticket,
    /// Newest first.
    pub entries: Vec<TimeEntry>,
    pub total_seconds: i64,
    pub can_add_hours: bool,
    pub can_add_others_hours: bool,
}

#[derive(Debug, Clone)]
pub struct UsersPage {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub milestone: Option<String>,
    pub milestones: Vec<Milestone>,
    pub worker_hours: Vec<(String, i64)>,
    pub prev_href: String,
}

#[derive(Debug, Clone)]
pub struct UserPage {
    pub worker: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Ticket id, summary and seconds, by ticket id.
    pub tickets: Vec<(i64, String, i64)>,
    pub dates: Vec<(NaiveDate, i64)>,
    pub total_seconds: i64,
    pub prev_href: String,
}

/// The rendered `totalhours` field of a ticket page.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalHoursField {
    pub hours: String,
    pub href: String,
    /// Hours including child tickets, when relations are enabled.
    pub with_children: Option<String>,
}

/// Pages of the host tracker that hours components decorate.
#[derive(Debug, Clone)]
pub enum HostPage {
    Ticket {
        /// `None` while the ticket is being created.
        ticket: Option<Ticket>,
        total_hours: Option<TotalHoursField>,
    },
    Roadmap {
        milestones: Vec<Milestone>,
        overlays: Vec<MilestoneHours>,
    },
    Milestone {
        milestone: Milestone,
        overlay: Option<MilestoneHours>,
    },
}
