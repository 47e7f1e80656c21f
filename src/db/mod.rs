//! SQLite persistence: the connection with its migrations, and one
//! repository per table group.

/// Connection setup and the immediate-transaction helper.
pub mod db;

/// Versioned schema changes applied on open.
pub mod migrations;

/// Saved report queries.
pub mod saved_queries;

/// Per-session cache of the last resolved ticket list.
pub mod sessions;

/// The host tracker's tickets, custom fields, changes, relations and
/// milestones.
pub mod tickets;

/// Time entries.
pub mod time_entries;
