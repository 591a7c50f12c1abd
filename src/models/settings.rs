use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// Key-value site configuration, seeded by `db::seed_defaults`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn get(pool: &DbPool, key: &str) -> Option<String> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .ok()
    }

    pub fn get_or(pool: &DbPool, key: &str, default: &str) -> String {
        Self::get(pool, key).unwrap_or_else(|| default.to_string())
    }

    /// Numeric setting; missing or unparsable values fall back to `default`.
    pub fn get_i64_or(pool: &DbPool, key: &str, default: i64) -> i64 {
        Self::get(pool, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}
