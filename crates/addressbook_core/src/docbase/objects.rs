//! `ContentStore` implementation over docbase tables.
//!
//! # Invariants
//! - Object rows and their attribute rows are written in one transaction.
//! - Deleting an object cascades to its attributes and content.
//! - Updates and deletes only match objects of the requested type.
//! - Containment filters use `instr`, so matching is case-sensitive and
//!   `%`/`_` have no wildcard meaning.

use super::Session;
use crate::store::{
    Attributes, AttributeFilter, Content, ContentStore, ObjectId, ObjectQuery, StoreError,
    StoreResult, StoredObject,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

impl ContentStore for Session {
    fn create_object(&self, object_type: &str, attributes: &Attributes) -> StoreResult<ObjectId> {
        let id = ObjectId::generate();
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO objects (object_id, object_type) VALUES (?1, ?2);",
            params![id.as_str(), object_type],
        )?;
        write_attributes(&tx, &id, attributes)?;
        tx.commit()?;
        Ok(id)
    }

    fn update_object(
        &self,
        object_type: &str,
        id: &ObjectId,
        attributes: &Attributes,
    ) -> StoreResult<()> {
        let tx = self.conn().unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE objects
             SET modified_at = (strftime('%s', 'now') * 1000)
             WHERE object_id = ?1 AND object_type = ?2;",
            params![id.as_str(), object_type],
        )?;
        if changed == 0 {
            return Err(StoreError::ObjectNotFound(id.clone()));
        }
        write_attributes(&tx, id, attributes)?;
        tx.commit()?;
        Ok(())
    }

    fn get_object(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let object_type = self
            .conn()
            .query_row(
                "SELECT object_type FROM objects WHERE object_id = ?1;",
                [id.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match object_type {
            Some(object_type) => Ok(Some(StoredObject {
                id: id.clone(),
                object_type,
                attributes: read_attributes(self.conn(), id)?,
            })),
            None => Ok(None),
        }
    }

    fn delete_object(&self, object_type: &str, id: &ObjectId) -> StoreResult<()> {
        let changed = self.conn().execute(
            "DELETE FROM objects WHERE object_id = ?1 AND object_type = ?2;",
            params![id.as_str(), object_type],
        )?;
        if changed == 0 {
            return Err(StoreError::ObjectNotFound(id.clone()));
        }
        Ok(())
    }

    fn query_objects(&self, query: &ObjectQuery) -> StoreResult<Vec<StoredObject>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            "SELECT o.object_id, o.object_type
             FROM objects o
             WHERE o.object_type = ?",
        );
        let mut bind_values = vec![Value::Text(query.object_type.clone())];

        if let Some(AttributeFilter::Contains { attribute, value }) = &query.filter {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM object_attributes a
                    WHERE a.object_id = o.object_id
                      AND a.name = ?
                      AND instr(a.value, ?) > 0
                )",
            );
            bind_values.push(Value::Text(attribute.clone()));
            bind_values.push(Value::Text(value.clone()));
        }

        if let Some(after) = &query.after {
            sql.push_str(" AND o.object_id > ?");
            bind_values.push(Value::Text(after.to_string()));
        }

        sql.push_str(" ORDER BY o.object_id ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut objects = Vec::new();

        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            let id = id_text.parse::<ObjectId>().map_err(|_| {
                StoreError::InvalidData(format!("invalid object id `{id_text}` in objects"))
            })?;
            objects.push(StoredObject {
                attributes: read_attributes(self.conn(), &id)?,
                id,
                object_type: row.get(1)?,
            });
        }

        Ok(objects)
    }

    fn set_content(&self, id: &ObjectId, format: &str, data: &[u8]) -> StoreResult<()> {
        let tx = self.conn().unchecked_transaction()?;
        let exists = tx
            .query_row(
                "SELECT 1 FROM objects WHERE object_id = ?1;",
                [id.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::ObjectNotFound(id.clone()));
        }

        let size = i64::try_from(data.len())
            .map_err(|_| StoreError::InvalidData("content larger than i64::MAX bytes".to_string()))?;
        tx.execute(
            "INSERT INTO object_contents (object_id, format, content_size, content)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (object_id) DO UPDATE SET
                format = excluded.format,
                content_size = excluded.content_size,
                content = excluded.content,
                set_at = (strftime('%s', 'now') * 1000);",
            params![id.as_str(), format, size, data],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_content(&self, id: &ObjectId) -> StoreResult<Option<Content>> {
        let content = self
            .conn()
            .query_row(
                "SELECT format, content FROM object_contents WHERE object_id = ?1;",
                [id.as_str()],
                |row| {
                    Ok(Content {
                        format: row.get(0)?,
                        data: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(content)
    }
}

fn write_attributes(conn: &Connection, id: &ObjectId, attributes: &Attributes) -> StoreResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO object_attributes (object_id, name, value)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (object_id, name) DO UPDATE SET value = excluded.value;",
    )?;
    for (name, value) in attributes {
        stmt.execute(params![id.as_str(), name, value])?;
    }
    Ok(())
}

fn read_attributes(conn: &Connection, id: &ObjectId) -> StoreResult<Attributes> {
    let mut stmt = conn.prepare_cached(
        "SELECT name, value FROM object_attributes WHERE object_id = ?1;",
    )?;
    let mut rows = stmt.query([id.as_str()])?;
    let mut attributes = Attributes::new();
    while let Some(row) = rows.next()? {
        attributes.insert(row.get(0)?, row.get(1)?);
    }
    Ok(attributes)
}
