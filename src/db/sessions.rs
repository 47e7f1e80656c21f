use crate::libs::error::Result;
use crate::libs::formatter::from_timestamp;
use crate::libs::session::QueryCache;
use rusqlite::{params, Connection, OptionalExtension};

const SELECT_CACHE: &str = "SELECT constraints, time, tickets FROM session_cache WHERE sid = ?1";
const UPSERT_CACHE: &str = "INSERT INTO session_cache (sid, constraints, time, tickets) VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(sid) DO UPDATE SET constraints = excluded.constraints, time = excluded.time, tickets = excluded.tickets";
const DELETE_CACHE: &str = "DELETE FROM session_cache WHERE sid = ?1";

/// Per-session query cache storage, keyed by session id.
pub struct Sessions<'a> {
    conn: &'a Connection,
}

impl<'a> Sessions<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Sessions { conn }
    }

    pub fn get(&self, sid: &str) -> Result<Option<QueryCache>> {
        let cache = self
            .conn
            .query_row(SELECT_CACHE, params![sid], |row| {
                Ok(QueryCache {
                    constraints: row.get(0)?,
                    time: from_timestamp(row.get(1)?),
                    tickets: QueryCache::parse_tickets(&row.get::<_, String>(2)?),
                })
            })
            .optional()?;
        Ok(cache)
    }

    pub fn save(&self, sid: &str, cache: &QueryCache) -> Result<()> {
        self.conn
            .execute(UPSERT_CACHE, params![sid, cache.constraints, cache.time.timestamp(), cache.tickets_text()])?;
        Ok(())
    }

    pub fn clear(&self, sid: &str) -> Result<()> {
        self.conn.execute(DELETE_CACHE, params![sid])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db::Db;
    use chrono::Utc;

    #[test]
    fn save_replace_and_clear() {
        let db = Db::open_in_memory().unwrap();
        let sessions = Sessions::new(&db.conn);
        assert!(sessions.get("joe").unwrap().is_none());

        let now = from_timestamp(Utc::now().timestamp());
        sessions.save("joe", &QueryCache::new("a=1".to_string(), now, vec![1, 2])).unwrap();
        sessions.save("joe", &QueryCache::new("a=2".to_string(), now, vec![2])).unwrap();

        let cache = sessions.get("joe").unwrap().unwrap();
        assert_eq!(cache.constraints, "a=2");
        assert_eq!(cache.tickets, vec![2]);
        assert_eq!(cache.time, now);

        sessions.clear("joe").unwrap();
        assert!(sessions.get("joe").unwrap().is_none());
    }
}
