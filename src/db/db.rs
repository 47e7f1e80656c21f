use crate::db::migrations::init_with_migrations;
use crate::libs::data_storage::DataStorage;
use crate::libs::error::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

pub const DB_FILE_NAME: &str = "tickethours.db";

/// Writers wait this long for the store's write lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the database in the default data directory.
    pub fn new() -> Result<Db> {
        Self::open(DataStorage::new().get_path(DB_FILE_NAME)?)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Db> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Db> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Db> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }

    /// Starts a transaction that takes the write lock up front.
    ///
    /// Dropping the transaction without committing rolls it back.
    pub fn immediate(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}
