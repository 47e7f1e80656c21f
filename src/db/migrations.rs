//! Versioned schema migrations.
//!
//! Each migration is recorded in the `migrations` table once applied. Pending
//! migrations run in order inside a single transaction when a [`Db`] is
//! opened, so a database is either fully upgraded or left untouched.
//!
//! The schema holds the hours tracker's own tables (`time_entry`,
//! `saved_query`, `session_cache`) next to the host tracker tables it reads
//! and writes (`ticket`, `ticket_custom`, `ticket_change`,
//! `ticket_relations`, `milestone`).
//!
//! ```rust
//! use tickethours::db::migrations::{get_db_version, init_with_migrations};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open_in_memory()?;
//! init_with_migrations(&mut conn)?;
//! assert_eq!(get_db_version(&conn)?, 4);
//! # Ok::<(), tickethours::libs::error::HoursError>(())
//! ```
//!
//! [`Db`]: crate::db::db::Db

use crate::libs::error::Result;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_error};
use rusqlite::{params, Connection, Transaction};

pub(crate) const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Debug, Clone)]
struct Migration {
    version: u32,
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: time entries plus the host ticket tables they hang off
        self.add_migration(1, "create_time_entry_and_ticket_tables", |tx| {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS time_entry (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ticket INTEGER NOT NULL,
                    time_submitted INTEGER NOT NULL,
                    worker TEXT NOT NULL,
                    submitter TEXT NOT NULL,
                    time_started INTEGER NOT NULL,
                    seconds_worked INTEGER NOT NULL CHECK (seconds_worked >= 0),
                    comments TEXT NOT NULL DEFAULT ''
                );
                CREATE INDEX IF NOT EXISTS idx_time_entry_ticket ON time_entry(ticket);
                CREATE INDEX IF NOT EXISTS idx_time_entry_worker ON time_entry(worker);
                CREATE INDEX IF NOT EXISTS idx_time_entry_time_started ON time_entry(time_started);

                CREATE TABLE IF NOT EXISTS ticket (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    type TEXT NOT NULL DEFAULT 'task',
                    time INTEGER NOT NULL,
                    changetime INTEGER NOT NULL,
                    component TEXT NOT NULL DEFAULT '',
                    priority TEXT NOT NULL DEFAULT 'major',
                    owner TEXT NOT NULL DEFAULT '',
                    reporter TEXT NOT NULL DEFAULT '',
                    milestone TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL DEFAULT 'new',
                    resolution TEXT NOT NULL DEFAULT '',
                    summary TEXT NOT NULL DEFAULT '',
                    description TEXT NOT NULL DEFAULT '',
                    keywords TEXT NOT NULL DEFAULT ''
                );
                CREATE TABLE IF NOT EXISTS ticket_custom (
                    ticket INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    value TEXT NOT NULL DEFAULT '',
                    PRIMARY KEY (ticket, name)
                );
                CREATE TABLE IF NOT EXISTS ticket_change (
                    ticket INTEGER NOT NULL,
                    time INTEGER NOT NULL,
                    author TEXT NOT NULL,
                    field TEXT NOT NULL,
                    oldvalue TEXT NOT NULL DEFAULT '',
                    newvalue TEXT NOT NULL DEFAULT ''
                );
                CREATE INDEX IF NOT EXISTS idx_ticket_change_ticket ON ticket_change(ticket);
                CREATE TABLE IF NOT EXISTS milestone (
                    name TEXT PRIMARY KEY,
                    due INTEGER,
                    completed INTEGER,
                    description TEXT NOT NULL DEFAULT ''
                );",
            )?;
            Ok(())
        });

        // Version 2: saved report queries
        self.add_migration(2, "add_saved_query", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS saved_query (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    query TEXT NOT NULL
                )",
                [],
            )?;
            Ok(())
        });

        // Version 3: totals for tickets created before the tracker existed
        self.add_migration(3, "initialize_totals_and_relations", |tx| {
            for field in ["totalhours", "estimatedhours"] {
                tx.execute(
                    "INSERT INTO ticket_custom (ticket, name, value)
                     SELECT id, ?1, '0' FROM ticket
                     WHERE id NOT IN (SELECT ticket FROM ticket_custom WHERE name = ?1)",
                    params![field],
                )?;
            }
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS ticket_relations (
                    oneself INTEGER NOT NULL,
                    ticket INTEGER NOT NULL,
                    relations TEXT NOT NULL,
                    PRIMARY KEY (oneself, ticket, relations)
                );",
            )?;
            Ok(())
        });

        // Version 4: per-session memo of the resolved ticket list
        self.add_migration(4, "add_session_cache", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS session_cache (
                    sid TEXT PRIMARY KEY,
                    constraints TEXT NOT NULL,
                    time INTEGER NOT NULL,
                    tickets TEXT NOT NULL
                )",
                [],
            )?;
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();

        if pending.is_empty() {
            msg_debug!(Message::DatabaseUpToDate);
            return Ok(());
        }

        msg_debug!(Message::MigrationsFound(pending.len()));

        let tx = conn.transaction()?;

        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));

            match (migration.up)(&tx) {
                Ok(()) => {
                    tx.execute(
                        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                        params![migration.version, migration.name],
                    )?;
                    msg_debug!(Message::MigrationCompleted(migration.version));
                }
                Err(e) => {
                    msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                    return Err(e);
                }
            }
        }

        tx.commit()?;
        msg_debug!(Message::AllMigrationsCompleted);

        Ok(())
    }

    /// Highest applied version, 0 for a fresh database.
    pub fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))?;
        Ok(version.unwrap_or(0))
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    pub fn is_migration_applied(&self, conn: &Connection, version: u32) -> Result<bool> {
        let count: i32 = conn.query_row("SELECT COUNT(*) FROM migrations WHERE version = ?1", params![version], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// `(version, name, applied_at)` for each applied migration, by version.
    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;
        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(history)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    MigrationManager::new().run_migrations(conn)
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    let manager = MigrationManager::new();
    Ok(manager.get_current_version(conn)? < manager.latest_version())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_is_fully_migrated() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert!(conn.execute(MIGRATIONS_TABLE, []).is_ok());
        assert!(needs_migration(&conn).unwrap());

        init_with_migrations(&mut conn).unwrap();
        assert_eq!(get_db_version(&conn).unwrap(), 4);
        assert!(!needs_migration(&conn).unwrap());

        // Re-running is a no-op
        init_with_migrations(&mut conn).unwrap();
        let history = MigrationManager::new().get_migration_history(&conn).unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].1, "create_time_entry_and_ticket_tables");
    }

    #[test]
    fn existing_tickets_get_zero_totals() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute(MIGRATIONS_TABLE, []).unwrap();
        let manager = MigrationManager::new();

        // Apply only the first two versions by hand, then add a legacy ticket.
        let tx = conn.transaction().unwrap();
        for migration in manager.migrations.iter().take(2) {
            (migration.up)(&tx).unwrap();
            tx.execute("INSERT INTO migrations (version, name) VALUES (?1, ?2)", params![migration.version, migration.name])
                .unwrap();
        }
        tx.execute("INSERT INTO ticket (time, changetime, summary) VALUES (0, 0, 'legacy')", []).unwrap();
        tx.commit().unwrap();

        manager.run_migrations(&mut conn).unwrap();
        let total: String = conn
            .query_row("SELECT value FROM ticket_custom WHERE ticket = 1 AND name = 'totalhours'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(total, "0");
        assert!(manager.is_migration_applied(&conn, 4).unwrap());
    }
}
