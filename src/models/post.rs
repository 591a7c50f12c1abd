use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content_html: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub sticky: bool,
    pub published_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub slug: String,
    pub content_html: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub sticky: bool,
    pub published_at: Option<String>,
}

fn parse_published_at(raw: Option<&String>) -> Option<NaiveDateTime> {
    raw.and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok())
}

impl Post {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Post {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            content_html: row.get("content_html")?,
            excerpt: row.get("excerpt")?,
            status: row.get("status")?,
            sticky: row.get::<_, i64>("sticky")? != 0,
            published_at: row.get("published_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM posts WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    /// Load posts in the order of `ids`, skipping ids that no longer exist.
    pub fn find_in_order(pool: &DbPool, ids: &[i64]) -> Vec<Self> {
        ids.iter().filter_map(|id| Self::find_by_id(pool, *id)).collect()
    }

    /// Published posts, newest first, for paginated listings ("load more").
    pub fn published(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM posts WHERE status = 'published'
             ORDER BY published_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool, status: Option<&str>) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };

        match status {
            Some(s) => conn
                .query_row(
                    "SELECT COUNT(*) FROM posts WHERE status = ?1",
                    params![s],
                    |row| row.get(0),
                )
                .unwrap_or(0),
            None => conn
                .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
                .unwrap_or(0),
        }
    }

    pub fn create(pool: &DbPool, form: &PostForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let published_at = parse_published_at(form.published_at.as_ref());

        conn.execute(
            "INSERT INTO posts (title, slug, content_html, excerpt, status, sticky, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.title,
                form.slug,
                form.content_html,
                form.excerpt,
                form.status,
                form.sticky as i64,
                published_at,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }
}
