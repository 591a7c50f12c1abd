use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Default on-disk database, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "website/db/kinpost.db";

/// Resolve the database path: `KINPOST_DB` wins over the default.
pub fn db_path() -> String {
    std::env::var("KINPOST_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
}

pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    Ok(init_pool_at(&db_path())?)
}

pub fn init_pool_at(path: &str) -> Result<DbPool, String> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(10)
        .build(manager)
        .map_err(|e| e.to_string())?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get().map_err(|e| e.to_string())?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(|e| e.to_string())?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Blog posts
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            content_html TEXT NOT NULL DEFAULT '',
            excerpt TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            sticky INTEGER NOT NULL DEFAULT 0,
            published_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_posts_status_date ON posts(status, published_at);

        -- Categories (tree via parent_id)
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            parent_id INTEGER,
            FOREIGN KEY (parent_id) REFERENCES categories(id)
        );

        -- Tags
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL
        );

        -- Many-to-many: content <-> categories
        CREATE TABLE IF NOT EXISTS content_categories (
            content_id INTEGER NOT NULL,
            content_type TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            UNIQUE(content_id, content_type, category_id)
        );

        -- Many-to-many: content <-> tags
        CREATE TABLE IF NOT EXISTS content_tags (
            content_id INTEGER NOT NULL,
            content_type TEXT NOT NULL,
            tag_id INTEGER NOT NULL,
            UNIQUE(content_id, content_type, tag_id)
        );

        CREATE INDEX IF NOT EXISTS idx_content_tags_tag ON content_tags(tag_id);
        CREATE INDEX IF NOT EXISTS idx_content_categories_cat ON content_categories(category_id);

        -- Star ratings (one aggregate row per post)
        CREATE TABLE IF NOT EXISTS star_ratings (
            post_id INTEGER PRIMARY KEY,
            total_score REAL NOT NULL DEFAULT 0,
            vote_count INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (post_id) REFERENCES posts(id)
        );

        -- Reaction counters
        CREATE TABLE IF NOT EXISTS reactions (
            post_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            count INTEGER NOT NULL DEFAULT 0,
            UNIQUE(post_id, kind),
            FOREIGN KEY (post_id) REFERENCES posts(id)
        );

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // Related posts
        ("related_posts_count", "4"),
        // Post listing
        ("posts_per_page", "10"),
        // Table of contents
        ("toc_min_headings", "2"),
        // Star ratings
        ("rating_votes_display_threshold", "50"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    Ok(())
}
