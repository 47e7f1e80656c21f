//! Session-scoped memo of the last ticket query.
//!
//! A report request resolves its constraints to a ticket list. The list is
//! remembered per session together with the canonical constraint string and
//! the time the query ran, and reused while both still hold.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct QueryCache {
    /// Canonical constraint string the ticket list was resolved from.
    pub constraints: String,
    /// When the query last executed.
    pub time: DateTime<Utc>,
    pub tickets: Vec<i64>,
}

impl QueryCache {
    pub fn new(constraints: String, time: DateTime<Utc>, tickets: Vec<i64>) -> Self {
        QueryCache { constraints, time, tickets }
    }

    /// The cached list may be reused for `constraints` at `now`.
    pub fn is_fresh(&self, constraints: &str, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.constraints == constraints && now.checked_sub_signed(ttl).map_or(true, |cutoff| self.time >= cutoff)
    }

    /// Space-separated ids, as persisted.
    pub fn tickets_text(&self) -> String {
        self.tickets.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" ")
    }

    /// Parses a persisted id list, ignoring anything that is not an id.
    pub fn parse_tickets(text: &str) -> Vec<i64> {
        text.split_whitespace().filter_map(|id| id.parse().ok()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_expires_and_tracks_constraints() {
        let now = Utc::now();
        let cache = QueryCache::new("status!=bogus".to_string(), now - Duration::minutes(59), vec![3, 1]);
        let ttl = Duration::hours(1);

        assert!(cache.is_fresh("status!=bogus", now, ttl));
        assert!(!cache.is_fresh("status=new", now, ttl));
        assert!(!cache.is_fresh("status!=bogus", now + Duration::minutes(2), ttl));
    }

    #[test]
    fn ttl_reaching_before_any_date_keeps_the_cache() {
        let now = Utc::now();
        let cache = QueryCache::new("status!=bogus".to_string(), now - Duration::days(365), vec![1]);
        assert!(cache.is_fresh("status!=bogus", now, Duration::MAX));
    }

    #[test]
    fn ticket_list_text_form() {
        let cache = QueryCache::new(String::new(), Utc::now(), vec![3, 1, 2]);
        assert_eq!(cache.tickets_text(), "3 1 2");
        assert_eq!(QueryCache::parse_tickets(" 3 x 1 "), vec![3, 1]);
    }
}
