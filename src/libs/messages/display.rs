//! Display implementation for tickethours messages.
//!
//! All user-facing text lives here, so the rest of the crate only deals in
//! `Message` values. Warnings shown in report banners, errors surfaced by
//! the request boundary and CLI notices all go through this one match.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === HOURS MESSAGES ===
            Message::HoursRecorded { ticket, hours, worker } => format!("Recorded {} hours on ticket #{} for {}", hours, ticket, worker),
            Message::HoursUpdated(count) => format!("Updated {} time entr{}", count, if *count == 1 { "y" } else { "ies" }),
            Message::HoursRemoved(count) => format!("Removed {} time entr{}", count, if *count == 1 { "y" } else { "ies" }),
            Message::HoursDeletedForTicket(ticket) => format!("Deleted all hours for ticket #{}", ticket),
            Message::HoursByComment(count, ticket) => format!("Logged {} time entr{} from comment on ticket #{}", count, if *count == 1 { "y" } else { "ies" }, ticket),
            // Tabs keep the logged phrase from being parsed as new hours
            Message::HoursLoggedComment { url, hours, worker, comments } => {
                format!("[{} {}\thours]\tlogged\tfor\t{}:\t''{}''", url, hours, worker, comments.replace(' ', "\t"))
            }
            Message::InvalidHours => "Please enter a valid number of hours".to_string(),
            Message::NegativeHours(seconds) => format!("Hours worked cannot be negative ({} seconds)", seconds),
            Message::TotalsRecomputed(count) => format!("Recomputed total hours for {} ticket(s)", count),
            Message::TimeEntryNotFound(id) => format!("Time entry {} not found", id),
            Message::NoHoursFound => "No hours found.".to_string(),
            Message::HoursWorkedBy { hours, worker } => format!("{} hours worked by {}", hours, worker),

            // === TICKET MESSAGES ===
            Message::TicketCreated(id) => format!("Ticket #{} created", id),
            Message::TicketDeleted(id) => format!("Ticket #{} deleted", id),
            Message::TicketNotFound(id) => format!("Ticket #{} does not exist", id),
            Message::CommentSaved(id) => format!("Comment saved on ticket #{}", id),
            Message::EstimatedHoursNotDefined => "The field is not defined. Please check your configuration.".to_string(),
            Message::EstimatedHoursNotANumber => "Please enter a number for Estimated Hours".to_string(),
            Message::EstimatedHoursNegative => "Please enter a positive value for Estimated Hours".to_string(),
            Message::EstimatedHoursUpdated(id, value) => format!("Estimated hours of ticket #{} set to {}", id, value),
            Message::MilestoneCreated(name) => format!("Milestone '{}' created", name),
            Message::TicketChildAdded(parent, child) => format!("Ticket #{} is now a child of #{}", child, parent),

            // === QUERY MESSAGES ===
            Message::QueryNotFound(id) => format!("No such query {}", id),
            Message::QueryIdNotInteger(value) => format!("query_id should be an integer, you put '{}'", value),
            Message::QuerySaved(id) => format!("Query {} saved", id),
            Message::QueryDeleted(id) => format!("Query {} deleted", id),
            Message::NoQueriesFound => "No saved queries".to_string(),
            Message::ConfirmDeleteQuery(title) => format!("Delete saved query '{}'?", title),
            Message::OperationCancelled => "Operation cancelled".to_string(),
            Message::QueryCacheHit(count) => format!("Reusing cached ticket list ({} tickets)", count),
            Message::QueryCacheRefreshed(count) => format!("Ticket query executed ({} tickets), session cache refreshed", count),
            Message::DefaultQueryUsed(query) => format!("Using default query: {}", query),
            Message::DoubleCountWarning => "Warning: estimated hours may be counted more than once if a ticket appears in multiple groups".to_string(),
            Message::InvalidDate(value) => format!("Invalid date '{}', expected YYYY-MM-DD", value),
            Message::InvalidConstraint(value) => format!("Invalid filter '{}', expected field=value", value),

            // === REPORT MESSAGES ===
            Message::ReportTitle { project, from, to } => format!("Hours worked on {} from {} to {}", project, from, to),
            Message::HoursFor(name) => format!("Hours for {}", name),
            Message::HoursForProject(project) => format!("Hours for {}", project),
            Message::HoursForTicket(id) => format!("Hours worked for ticket {}", id),
            Message::Hours => "Hours".to_string(),
            Message::ExportCompleted(path) => format!("Export completed successfully: {}", path),

            // === PERMISSION MESSAGES ===
            Message::AnonymousUser => "anonymous".to_string(),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed".to_string(),
            Message::PromptProjectName => "Project name".to_string(),
            Message::PromptBaseUrl => "Base URL used in feeds and exports".to_string(),
            Message::PromptDefaultUser => "Default user".to_string(),
            Message::PromptDefaultQuery => "Default ticket query".to_string(),
            Message::PromptCacheTtl => "Query cache lifetime (seconds)".to_string(),
            Message::PromptRelations => "Sum hours of child tickets".to_string(),
            Message::PromptQueryTitle => "Title".to_string(),
            Message::PromptQueryDescription => "Description".to_string(),
            Message::PromptQuery => "Query".to_string(),

            // === DATABASE MESSAGES ===
            Message::UnknownRoute(path) => format!("No handler matched the request to {}", path),

            // === MIGRATION MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending database migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationCompleted(version) => format!("✓ Migration v{} completed", version),
            Message::MigrationFailed(version, error) => format!("✗ Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All migrations completed successfully".to_string(),
            Message::DatabaseVersion(version) => format!("Database schema version: {}", version),
            Message::DatabaseUpToDate => "Database is up to date".to_string(),
            Message::DatabaseNeedsUpdate => "Database needs to be updated".to_string(),
            Message::MigrationHistory => "Migration history:".to_string(),
        };

        write!(f, "{}", text)
    }
}
