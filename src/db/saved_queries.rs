use crate::libs::error::{HoursError, Result};
use crate::libs::messages::Message;
use crate::libs::query::SavedQuery;
use rusqlite::{params, Connection, OptionalExtension, Row};

const INSERT_QUERY: &str = "INSERT INTO saved_query (title, description, query) VALUES (?1, ?2, ?3)";
const UPDATE_QUERY: &str = "UPDATE saved_query SET title = ?1, description = ?2, query = ?3 WHERE id = ?4";
const SELECT_QUERIES: &str = "SELECT id, title, description, query FROM saved_query";
const DELETE_QUERY: &str = "DELETE FROM saved_query WHERE id = ?1";

pub struct SavedQueries<'a> {
    conn: &'a Connection,
}

impl<'a> SavedQueries<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SavedQueries { conn }
    }

    /// Stores `query` and returns it with its new id.
    pub fn insert(&self, query: &SavedQuery) -> Result<SavedQuery> {
        self.conn.execute(INSERT_QUERY, params![query.title, query.description, query.query])?;
        Ok(SavedQuery {
            id: self.conn.last_insert_rowid(),
            ..query.clone()
        })
    }

    pub fn update(&self, query: &SavedQuery) -> Result<()> {
        let updated = self
            .conn
            .execute(UPDATE_QUERY, params![query.title, query.description, query.query, query.id])?;
        if updated == 0 {
            return Err(HoursError::not_found(Message::QueryNotFound(query.id)));
        }
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<SavedQuery> {
        self.conn
            .query_row(&format!("{} WHERE id = ?1", SELECT_QUERIES), params![id], Self::map_row)
            .optional()?
            .ok_or_else(|| HoursError::not_found(Message::QueryNotFound(id)))
    }

    pub fn list(&self) -> Result<Vec<SavedQuery>> {
        let mut stmt = self.conn.prepare(&format!("{} ORDER BY id", SELECT_QUERIES))?;
        let queries = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(queries)
    }

    pub fn delete(&self, id: i64) -> Result<usize> {
        Ok(self.conn.execute(DELETE_QUERY, params![id])?)
    }

    fn map_row(row: &Row) -> rusqlite::Result<SavedQuery> {
        Ok(SavedQuery {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            query: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db::Db;

    #[test]
    fn saved_query_lifecycle() {
        let db = Db::open_in_memory().unwrap();
        let queries = SavedQueries::new(&db.conn);

        let saved = queries.insert(&SavedQuery::new("Mine", "", "owner=$USER")).unwrap();
        assert_eq!(queries.get(saved.id).unwrap().query, "owner=$USER");

        let renamed = SavedQuery {
            title: "My open tickets".to_string(),
            ..saved.clone()
        };
        queries.update(&renamed).unwrap();
        assert_eq!(queries.list().unwrap()[0].title, "My open tickets");

        assert_eq!(queries.delete(saved.id).unwrap(), 1);
        match queries.get(saved.id) {
            Err(HoursError::NotFound(Message::QueryNotFound(id))) => assert_eq!(id, saved.id),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
