use rusqlite::types::ToSql;

use crate::db::DbPool;
use crate::models::category::Category;
use crate::models::tag::Tag;

use super::{ContentRepository, Direction, OrderBy, PostQuery, TaxonomyDirectory};

/// SQLite-backed implementation of the repository traits.
/// Wraps the r2d2 connection pool; every call checks out its own connection.
#[derive(Clone)]
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Build the SQL and bound parameters for a post query.
fn build_post_query(query: &PostQuery) -> (String, Vec<Box<dyn ToSql>>) {
    let mut sql = String::from("SELECT p.id FROM posts p WHERE p.status = 'published'");
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();

    if !query.tag_ids.is_empty() {
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM content_tags ct
               WHERE ct.content_id = p.id AND ct.content_type = 'post' AND ct.tag_id IN ({}))",
            placeholders(query.tag_ids.len())
        ));
        for id in &query.tag_ids {
            params_vec.push(Box::new(*id));
        }
    }

    if !query.category_ids.is_empty() {
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM content_categories cc
               WHERE cc.content_id = p.id AND cc.content_type = 'post' AND cc.category_id IN ({}))",
            placeholders(query.category_ids.len())
        ));
        for id in &query.category_ids {
            params_vec.push(Box::new(*id));
        }
    }

    if !query.exclude_ids.is_empty() {
        sql.push_str(&format!(
            " AND p.id NOT IN ({})",
            placeholders(query.exclude_ids.len())
        ));
        for id in &query.exclude_ids {
            params_vec.push(Box::new(*id));
        }
    }

    sql.push_str(" ORDER BY ");
    if !query.ignore_sticky {
        sql.push_str("p.sticky DESC, ");
    }
    match (query.order_by, query.direction) {
        (OrderBy::Default, _) | (OrderBy::PublishedAt, Direction::Desc) => {
            sql.push_str("p.published_at DESC, p.id DESC")
        }
        (OrderBy::PublishedAt, Direction::Asc) => sql.push_str("p.published_at ASC, p.id ASC"),
    }

    sql.push_str(" LIMIT ?");
    params_vec.push(Box::new(i64::try_from(query.limit).unwrap_or(i64::MAX)));

    (sql, params_vec)
}

impl ContentRepository for SqliteStore {
    fn query_post_ids(&self, query: &PostQuery) -> Result<Vec<i64>, String> {
        if query.limit == 0 {
            return Ok(vec![]);
        }

        let (sql, params_vec) = build_post_query(query);
        let conn = self.pool.get().map_err(|e| e.to_string())?;
        let mut stmt = conn.prepare(&sql).map_err(|e| e.to_string())?;

        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(params_refs.as_slice(), |row| row.get::<_, i64>(0))
            .map_err(|e| e.to_string())?;
        rows.collect::<rusqlite::Result<Vec<i64>>>()
            .map_err(|e| e.to_string())
    }
}

impl TaxonomyDirectory for SqliteStore {
    fn all_tags(&self) -> Result<Vec<Tag>, String> {
        Tag::list(&self.pool)
    }

    fn tags_for_post(&self, post_id: i64) -> Result<Vec<Tag>, String> {
        Tag::for_content(&self.pool, post_id, "post")
    }

    fn category_ids_for_post(&self, post_id: i64) -> Result<Vec<i64>, String> {
        Category::ids_for_content(&self.pool, post_id, "post")
    }
}
