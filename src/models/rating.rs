use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::db::DbPool;

pub const MIN_RATING: f64 = 0.5;
pub const MAX_RATING: f64 = 5.0;

/// Aggregate star rating for one post.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StarRating {
    pub post_id: i64,
    pub total_score: f64,
    pub vote_count: i64,
}

impl StarRating {
    pub fn for_post(pool: &DbPool, post_id: i64) -> Result<Self, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let row: Option<(f64, i64)> = conn
            .query_row(
                "SELECT total_score, vote_count FROM star_ratings WHERE post_id = ?1",
                params![post_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| e.to_string())?;
        let (total_score, vote_count) = row.unwrap_or((0.0, 0));
        Ok(StarRating {
            post_id,
            total_score,
            vote_count,
        })
    }

    /// Mean score rounded to one decimal; 0 without votes.
    pub fn average(&self) -> f64 {
        if self.vote_count <= 0 {
            return 0.0;
        }
        let avg = self.total_score / self.vote_count as f64;
        (avg * 10.0).round() / 10.0
    }

    /// Short label for listings. Vote count is spelled out once it
    /// reaches `threshold`.
    pub fn summary_text(&self, threshold: i64) -> Option<String> {
        if self.vote_count <= 0 {
            return None;
        }
        if self.vote_count >= threshold {
            Some(format!("{:.1} ({} votes)", self.average(), self.vote_count))
        } else {
            Some(format!("{:.1} rating", self.average()))
        }
    }

    /// Record a vote. A positive `old_rating` means the visitor is editing
    /// a previous vote, so the count stays put.
    pub fn submit(
        pool: &DbPool,
        post_id: i64,
        new_rating: f64,
        old_rating: Option<f64>,
    ) -> Result<Self, String> {
        if !(MIN_RATING..=MAX_RATING).contains(&new_rating) {
            return Err("Invalid rating.".to_string());
        }

        let current = Self::for_post(pool, post_id)?;
        let (total_score, vote_count) = match old_rating {
            Some(old) if old > 0.0 => (current.total_score - old + new_rating, current.vote_count),
            _ => (current.total_score + new_rating, current.vote_count + 1),
        };

        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO star_ratings (post_id, total_score, vote_count) VALUES (?1, ?2, ?3)
             ON CONFLICT(post_id) DO UPDATE SET total_score = ?2, vote_count = ?3",
            params![post_id, total_score, vote_count],
        )
        .map_err(|e| e.to_string())?;

        log::debug!(
            "Rating for post {} now {:.1} over {} votes",
            post_id,
            total_score,
            vote_count
        );

        Ok(StarRating {
            post_id,
            total_score,
            vote_count,
        })
    }
}
