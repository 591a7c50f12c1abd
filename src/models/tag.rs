use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct TagForm {
    pub name: String,
    pub slug: String,
}

impl Tag {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Tag {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
        })
    }

    /// Lowercased whitespace-separated tokens of the tag name.
    pub fn words(&self) -> Vec<String> {
        self.name
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM tags WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Every tag on the site, including ones no post uses yet.
    pub fn list(pool: &DbPool) -> Result<Vec<Self>, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let mut stmt = conn
            .prepare("SELECT * FROM tags ORDER BY name, id")
            .map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map([], Self::from_row)
            .map_err(|e| e.to_string())?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| e.to_string())
    }

    pub fn for_content(pool: &DbPool, content_id: i64, content_type: &str) -> Result<Vec<Self>, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let mut stmt = conn
            .prepare(
                "SELECT t.* FROM tags t
                 JOIN content_tags ct ON ct.tag_id = t.id
                 WHERE ct.content_id = ?1 AND ct.content_type = ?2
                 ORDER BY t.name, t.id",
            )
            .map_err(|e| e.to_string())?;
        let rows = stmt
            .query_map(params![content_id, content_type], Self::from_row)
            .map_err(|e| e.to_string())?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| e.to_string())
    }

    pub fn create(pool: &DbPool, form: &TagForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO tags (name, slug) VALUES (?1, ?2)",
            params![form.name, form.slug],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_for_content(
        pool: &DbPool,
        content_id: i64,
        content_type: &str,
        tag_ids: &[i64],
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM content_tags WHERE content_id = ?1 AND content_type = ?2",
            params![content_id, content_type],
        )
        .map_err(|e| e.to_string())?;

        for tag_id in tag_ids {
            conn.execute(
                "INSERT OR IGNORE INTO content_tags (content_id, content_type, tag_id) VALUES (?1, ?2, ?3)",
                params![content_id, content_type, tag_id],
            )
            .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    pub fn find_or_create(pool: &DbPool, name: &str) -> Result<i64, String> {
        let slug_str = slug::slugify(name);
        if let Some(existing) = Self::find_by_slug(pool, &slug_str) {
            return Ok(existing.id);
        }
        Self::create(
            pool,
            &TagForm {
                name: name.to_string(),
                slug: slug_str,
            },
        )
    }
}
