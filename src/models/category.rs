use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

impl Category {
    pub fn ids_for_content(pool: &DbPool, content_id: i64, content_type: &str) -> Result<Vec<i64>, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let mut stmt = conn
            .prepare(
                "SELECT category_id FROM content_categories
                 WHERE content_id = ?1 AND content_type = ?2
                 ORDER BY category_id",
            )
            .map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map(params![content_id, content_type], |row| row.get(0))
            .map_err(|e| e.to_string())?;
        rows.collect::<rusqlite::Result<Vec<i64>>>()
            .map_err(|e| e.to_string())
    }

    pub fn create(pool: &DbPool, form: &CategoryForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO categories (name, slug, parent_id) VALUES (?1, ?2, ?3)",
            params![form.name, form.slug, form.parent_id],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_for_content(
        pool: &DbPool,
        content_id: i64,
        content_type: &str,
        category_ids: &[i64],
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM content_categories WHERE content_id = ?1 AND content_type = ?2",
            params![content_id, content_type],
        )
        .map_err(|e| e.to_string())?;

        for cat_id in category_ids {
            conn.execute(
                "INSERT OR IGNORE INTO content_categories (content_id, content_type, category_id) VALUES (?1, ?2, ?3)",
                params![content_id, content_type, cat_id],
            )
            .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}
