//! An opened tracker: database plus configuration.

use crate::db::db::{Db, DB_FILE_NAME};
use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::libs::error::Result;

pub struct Env {
    pub db: Db,
    pub config: Config,
}

impl Env {
    /// Opens the tracker in the default data directory.
    pub fn new() -> Result<Env> {
        Self::open(&DataStorage::new())
    }

    /// Opens the database and reads the configuration kept in `storage`.
    pub fn open(storage: &DataStorage) -> Result<Env> {
        let config = Config::read_from(storage)?;
        let db = Db::open(storage.get_path(DB_FILE_NAME)?)?;
        Ok(Env { db, config })
    }

    pub fn in_memory(config: Config) -> Result<Env> {
        Ok(Env { db: Db::open_in_memory()?, config })
    }
}
