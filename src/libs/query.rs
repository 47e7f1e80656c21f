//! Ticket constraint language and saved queries.
//!
//! A query string is a `&`-separated list of clauses, each naming a ticket
//! field, an operator and `|`-separated values:
//!
//! ```rust
//! use tickethours::libs::query::{ConstraintMode, ConstraintSet};
//!
//! let set = ConstraintSet::parse("status!=closed|bogus&owner=joe")?;
//! assert_eq!(set.get("status").unwrap().mode, ConstraintMode::IsNot);
//! assert_eq!(set.to_string(), "owner=joe&status!=closed|bogus");
//! # Ok::<(), tickethours::libs::error::HoursError>(())
//! ```
//!
//! The canonical form sorts clauses by field name, so two requests for the
//! same ticket set serialize identically. That string keys the session cache.

use crate::libs::error::{HoursError, Result};
use crate::libs::messages::Message;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder replaced by the viewer's identity.
pub const USER_PLACEHOLDER: &str = "$USER";

static FIELD_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintMode {
    Is,
    IsNot,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

impl ConstraintMode {
    pub fn operator(&self) -> &'static str {
        match self {
            ConstraintMode::Is => "=",
            ConstraintMode::IsNot => "!=",
            ConstraintMode::Contains => "~=",
            ConstraintMode::NotContains => "!~=",
            ConstraintMode::StartsWith => "^=",
            ConstraintMode::EndsWith => "$=",
        }
    }

    /// Mode named by a `<field>_mode` form value (the operator without `=`).
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "" => Some(ConstraintMode::Is),
            "!" => Some(ConstraintMode::IsNot),
            "~" => Some(ConstraintMode::Contains),
            "!~" => Some(ConstraintMode::NotContains),
            "^" => Some(ConstraintMode::StartsWith),
            "$" => Some(ConstraintMode::EndsWith),
            _ => None,
        }
    }

    /// The operator without `=`, as used in form values.
    pub fn prefix(&self) -> &'static str {
        self.operator().trim_end_matches('=')
    }

    /// Splits a form value such as `!closed` into its mode and value.
    pub fn split_value(value: &str) -> (Self, &str) {
        for prefix in ["!~", "!", "~", "^", "$"] {
            if let Some(rest) = value.strip_prefix(prefix) {
                if let Some(mode) = Self::from_prefix(prefix) {
                    return (mode, rest);
                }
            }
        }
        (ConstraintMode::Is, value)
    }

    pub fn is_negated(&self) -> bool {
        matches!(self, ConstraintMode::IsNot | ConstraintMode::NotContains)
    }

    /// Whether a ticket value satisfies this mode for one constraint value.
    pub fn matches(&self, actual: &str, expected: &str) -> bool {
        match self {
            ConstraintMode::Is => actual == expected,
            ConstraintMode::IsNot => actual != expected,
            ConstraintMode::Contains => actual.contains(expected),
            ConstraintMode::NotContains => !actual.contains(expected),
            ConstraintMode::StartsWith => actual.starts_with(expected),
            ConstraintMode::EndsWith => actual.ends_with(expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub mode: ConstraintMode,
    pub values: Vec<String>,
}

impl Constraint {
    /// Positive modes match any value, negated modes must hold for all.
    pub fn accepts(&self, actual: &str) -> bool {
        if self.mode.is_negated() {
            self.values.iter().all(|v| self.mode.matches(actual, v))
        } else {
            self.values.iter().any(|v| self.mode.matches(actual, v))
        }
    }
}

/// Constraints on ticket fields, ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    constraints: BTreeMap<String, Constraint>,
}

impl ConstraintSet {
    pub fn parse(query: &str) -> Result<Self> {
        let mut set = ConstraintSet::default();

        for clause in query.split('&').map(str::trim).filter(|c| !c.is_empty()) {
            let invalid = || HoursError::validation(Message::InvalidConstraint(clause.to_string()));
            let eq = clause.find('=').ok_or_else(invalid)?;
            let (head, values) = (&clause[..eq], &clause[eq + 1..]);

            let (field, mode) = if let Some(field) = head.strip_suffix("!~") {
                (field, ConstraintMode::NotContains)
            } else if let Some(field) = head.strip_suffix('~') {
                (field, ConstraintMode::Contains)
            } else if let Some(field) = head.strip_suffix('!') {
                (field, ConstraintMode::IsNot)
            } else if let Some(field) = head.strip_suffix('^') {
                (field, ConstraintMode::StartsWith)
            } else if let Some(field) = head.strip_suffix('$') {
                (field, ConstraintMode::EndsWith)
            } else {
                (head, ConstraintMode::Is)
            };

            if !FIELD_NAME.is_match(field) {
                return Err(invalid());
            }
            set.insert(field, mode, values.split('|').map(str::to_string).collect());
        }

        Ok(set)
    }

    /// Builds constraints from request arguments.
    ///
    /// Every argument named after a ticket field is a value; a
    /// `<field>_mode` argument or a mode prefix on the value selects the
    /// operator.
    pub fn from_args(args: &[(String, String)], is_field: impl Fn(&str) -> bool) -> Self {
        let mut set = ConstraintSet::default();
        for (field, value) in args.iter().filter(|(k, _)| is_field(k)) {
            let mode_key = format!("{}_mode", field);
            let mode = args.iter().find(|(k, _)| *k == mode_key).map(|(_, v)| v.as_str()).unwrap_or("");
            let raw = format!("{}{}", mode, value);
            let (mode, value) = ConstraintMode::split_value(&raw);
            set.insert(field, mode, vec![value.to_string()]);
        }
        set
    }

    /// Request arguments reproducing this set, one per value.
    pub fn to_args(&self) -> Vec<(String, String)> {
        self.constraints
            .iter()
            .flat_map(|(field, c)| c.values.iter().map(move |v| (field.clone(), format!("{}{}", c.mode.prefix(), v))))
            .collect()
    }

    /// Adds values for `field`. Values with the same mode accumulate, a
    /// different mode replaces the constraint.
    pub fn insert(&mut self, field: &str, mode: ConstraintMode, values: Vec<String>) {
        match self.constraints.get_mut(field) {
            Some(existing) if existing.mode == mode => existing.values.extend(values),
            _ => {
                self.constraints.insert(field.to_string(), Constraint { mode, values });
            }
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<Constraint> {
        self.constraints.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&Constraint> {
        self.constraints.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Constraint)> {
        self.constraints.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Replaces `$USER` with `user`, or drops every constraint that depends
    /// on it when the viewer has no identity.
    pub fn substitute_user(&mut self, user: Option<&str>) {
        match user {
            Some(user) => {
                for constraint in self.constraints.values_mut() {
                    for value in constraint.values.iter_mut() {
                        *value = value.replace(USER_PLACEHOLDER, user);
                    }
                }
            }
            None => self
                .constraints
                .retain(|_, c| !c.values.iter().any(|v| v.ends_with(USER_PLACEHOLDER))),
        }
    }

    /// The `status!=bogus` placeholder filter, left out of exports.
    pub fn is_placeholder(field: &str, constraint: &Constraint) -> bool {
        field == "status" && constraint.values == ["bogus"]
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self
            .constraints
            .iter()
            .map(|(field, c)| format!("{}{}{}", field, c.mode.operator(), c.values.join("|")))
            .collect();
        f.write_str(&clauses.join("&"))
    }
}

/// A ticket query: constraints plus ordering, grouping and paging.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketQuery {
    pub constraints: ConstraintSet,
    /// Ticket field to order by; `None` orders by id.
    pub order: Option<String>,
    pub desc: bool,
    /// Native ticket field to group by.
    pub group: Option<String>,
    pub groupdesc: bool,
    /// 1-based page number.
    pub page: usize,
    /// Tickets per page, 0 for unlimited.
    pub max: usize,
}

impl TicketQuery {
    pub fn new(constraints: ConstraintSet) -> Self {
        TicketQuery {
            constraints,
            order: None,
            desc: false,
            group: None,
            groupdesc: false,
            page: 1,
            max: 0,
        }
    }
}

/// A named, persisted query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub query: String,
}

impl SavedQuery {
    pub fn new(title: &str, description: &str, query: &str) -> Self {
        SavedQuery {
            id: 0,
            title: title.to_string(),
            description: description.to_string(),
            query: query.to_string(),
        }
    }
}
