use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::db::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Helpful,
    Fun,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Helpful,
        ReactionKind::Fun,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Helpful => "helpful",
            ReactionKind::Fun => "fun",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReactionKind::Like => "Like",
            ReactionKind::Love => "Love",
            ReactionKind::Helpful => "Helpful",
            ReactionKind::Fun => "Interesting",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ReactionKind::Like => "👍",
            ReactionKind::Love => "❤️",
            ReactionKind::Helpful => "💡",
            ReactionKind::Fun => "😄",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ReactionCount {
    pub kind: ReactionKind,
    pub count: i64,
}

pub struct Reaction;

impl Reaction {
    /// Bump the counter for `kind` and return the new value.
    pub fn increment(pool: &DbPool, post_id: i64, kind: ReactionKind) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO reactions (post_id, kind, count) VALUES (?1, ?2, 1)
             ON CONFLICT(post_id, kind) DO UPDATE SET count = count + 1",
            params![post_id, kind.key()],
        )
        .map_err(|e| e.to_string())?;
        conn.query_row(
            "SELECT count FROM reactions WHERE post_id = ?1 AND kind = ?2",
            params![post_id, kind.key()],
            |row| row.get(0),
        )
        .map_err(|e| e.to_string())
    }

    /// Every reaction kind with its count, in display order.
    pub fn counts(pool: &DbPool, post_id: i64) -> Result<Vec<ReactionCount>, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let mut out = Vec::with_capacity(ReactionKind::ALL.len());
        for kind in ReactionKind::ALL {
            let count: Option<i64> = conn
                .query_row(
                    "SELECT count FROM reactions WHERE post_id = ?1 AND kind = ?2",
                    params![post_id, kind.key()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| e.to_string())?;
            out.push(ReactionCount {
                kind,
                count: count.unwrap_or(0),
            });
        }
        Ok(out)
    }
}
