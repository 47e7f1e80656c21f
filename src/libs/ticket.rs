use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Custom field holding the denormalized hours total.
pub const TOTAL_HOURS: &str = "totalhours";

/// Custom field holding the estimate, as decimal hours text.
pub const ESTIMATED_HOURS: &str = "estimatedhours";

/// Ticket columns that can be filtered, ordered and grouped on directly.
pub const NATIVE_FIELDS: &[&str] = &[
    "id",
    "type",
    "time",
    "changetime",
    "component",
    "priority",
    "owner",
    "reporter",
    "milestone",
    "status",
    "resolution",
    "summary",
    "description",
    "keywords",
];

/// Fields a query can constrain: the native columns and the hours fields.
pub fn is_ticket_field(name: &str) -> bool {
    NATIVE_FIELDS.contains(&name) || name == TOTAL_HOURS || name == ESTIMATED_HOURS
}

/// A ticket of the host tracker, with its custom fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: i64,
    pub ticket_type: String,
    pub time: DateTime<Utc>,
    pub changetime: DateTime<Utc>,
    pub component: String,
    pub priority: String,
    pub owner: String,
    pub reporter: String,
    pub milestone: String,
    pub status: String,
    pub resolution: String,
    pub summary: String,
    pub description: String,
    pub keywords: String,
    pub custom: BTreeMap<String, String>,
}

impl Ticket {
    /// Value of a native or custom field, as text.
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "id" => self.id.to_string(),
            "type" => self.ticket_type.clone(),
            "time" => self.time.timestamp().to_string(),
            "changetime" => self.changetime.timestamp().to_string(),
            "component" => self.component.clone(),
            "priority" => self.priority.clone(),
            "owner" => self.owner.clone(),
            "reporter" => self.reporter.clone(),
            "milestone" => self.milestone.clone(),
            "status" => self.status.clone(),
            "resolution" => self.resolution.clone(),
            "summary" => self.summary.clone(),
            "description" => self.description.clone(),
            "keywords" => self.keywords.clone(),
            custom => return self.custom.get(custom).cloned(),
        };
        Some(value)
    }

    /// Estimated hours, zero when unset or not a number.
    pub fn estimated_hours(&self) -> f64 {
        self.custom
            .get(ESTIMATED_HOURS)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|h| h.is_finite())
            .unwrap_or(0.0)
    }
}

/// Fields of a ticket about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub summary: String,
    pub reporter: String,
    pub owner: String,
    pub component: String,
    pub milestone: String,
    pub status: String,
    pub estimated_hours: Option<String>,
}

impl NewTicket {
    pub fn new(summary: &str, reporter: &str) -> Self {
        NewTicket {
            summary: summary.to_string(),
            reporter: reporter.to_string(),
            status: "new".to_string(),
            ..Default::default()
        }
    }
}

/// A comment in a ticket's change log.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketComment {
    pub time: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub name: String,
    pub due: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_falls_back_to_zero() {
        let mut ticket = Ticket {
            id: 1,
            ticket_type: "task".to_string(),
            time: Utc::now(),
            changetime: Utc::now(),
            component: String::new(),
            priority: String::new(),
            owner: String::new(),
            reporter: String::new(),
            milestone: String::new(),
            status: "new".to_string(),
            resolution: String::new(),
            summary: "s".to_string(),
            description: String::new(),
            keywords: String::new(),
            custom: BTreeMap::new(),
        };
        assert_eq!(ticket.estimated_hours(), 0.0);
        ticket.custom.insert(ESTIMATED_HOURS.to_string(), "soon".to_string());
        assert_eq!(ticket.estimated_hours(), 0.0);
        ticket.custom.insert(ESTIMATED_HOURS.to_string(), "2.5".to_string());
        assert_eq!(ticket.estimated_hours(), 2.5);
        assert_eq!(ticket.field("status").as_deref(), Some("new"));
        assert_eq!(ticket.field("estimatedhours").as_deref(), Some("2.5"));
        assert_eq!(ticket.field("nope"), None);
    }
}
