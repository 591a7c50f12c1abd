#[macro_use]
extern crate rocket;

pub mod boot;
pub mod db;
pub mod models;
pub mod related;
pub mod routes;
pub mod store;
pub mod toc;

pub use related::{select_related, RelatedRequest, DEFAULT_RELATED_COUNT};
