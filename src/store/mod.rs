use crate::models::tag::Tag;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Sort key for a post query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// Repository default: newest first, id as tiebreaker.
    Default,
    PublishedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Filter criteria for published posts. Tag and category sets are OR'ed;
/// an empty set means "no filter on that taxonomy".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub tag_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
    pub exclude_ids: Vec<i64>,
    pub limit: usize,
    pub order_by: OrderBy,
    pub direction: Direction,
    pub ignore_sticky: bool,
}

impl PostQuery {
    /// Any published post, newest first, sticky posts not promoted.
    pub fn published(limit: usize) -> Self {
        PostQuery {
            tag_ids: Vec::new(),
            category_ids: Vec::new(),
            exclude_ids: Vec::new(),
            limit,
            order_by: OrderBy::Default,
            direction: Direction::Desc,
            ignore_sticky: true,
        }
    }

    pub fn with_tags(mut self, tag_ids: &[i64]) -> Self {
        self.tag_ids = tag_ids.to_vec();
        self
    }

    pub fn with_categories(mut self, category_ids: &[i64]) -> Self {
        self.category_ids = category_ids.to_vec();
        self
    }

    pub fn excluding(mut self, ids: &[i64]) -> Self {
        self.exclude_ids = ids.to_vec();
        self
    }

    pub fn order(mut self, order_by: OrderBy, direction: Direction) -> Self {
        self.order_by = order_by;
        self.direction = direction;
        self
    }
}

/// Read access to published posts.
pub trait ContentRepository: Send + Sync {
    fn query_post_ids(&self, query: &PostQuery) -> Result<Vec<i64>, String>;
}

/// Read access to tags and categories.
/// A post that does not exist simply has no tags or categories.
pub trait TaxonomyDirectory: Send + Sync {
    fn all_tags(&self) -> Result<Vec<Tag>, String>;
    fn tags_for_post(&self, post_id: i64) -> Result<Vec<Tag>, String>;
    fn category_ids_for_post(&self, post_id: i64) -> Result<Vec<i64>, String>;
}
