use chrono::NaiveDateTime;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::DbPool;
use crate::models::post::Post;
use crate::models::rating::StarRating;
use crate::models::reaction::{Reaction, ReactionKind};
use crate::models::settings::Setting;
use crate::related::{RelatedRequest, DEFAULT_RELATED_COUNT};
use crate::store::SqliteStore;
use crate::toc::{add_heading_ids, HeadingAnchors, Toc, TocEntry};

type ApiError = (Status, Json<Value>);

fn api_error(status: Status, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

fn published_post(pool: &DbPool, id: i64) -> Result<Post, ApiError> {
    Post::find_by_id(pool, id)
        .filter(|p| p.status == "published")
        .ok_or_else(|| api_error(Status::NotFound, "post not found"))
}

fn storage_error(context: &str, e: String) -> ApiError {
    log::error!("{}: {}", context, e);
    api_error(Status::InternalServerError, "storage error")
}

// ── Post listing ───────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub items: Vec<RelatedItem>,
    pub page: u32,
    pub has_more: bool,
}

/// Published posts, newest first. `page` starts at 1.
#[get("/posts?<page>")]
pub fn post_list(pool: &State<DbPool>, page: Option<u32>) -> Json<PostListResponse> {
    let page = page.unwrap_or(1).max(1);
    let per_page = Setting::get_i64_or(pool, "posts_per_page", 10).max(1);
    let offset = (page as i64 - 1).saturating_mul(per_page);

    let items: Vec<RelatedItem> = Post::published(pool, per_page, offset)
        .into_iter()
        .map(RelatedItem::from)
        .collect();
    let total = Post::count(pool, Some("published"));
    let has_more = offset.saturating_add(items.len() as i64) < total;

    Json(PostListResponse {
        items,
        page,
        has_more,
    })
}

// ── Related posts ──────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RelatedItem {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub published_at: Option<NaiveDateTime>,
}

impl From<Post> for RelatedItem {
    fn from(p: Post) -> Self {
        RelatedItem {
            id: p.id,
            title: p.title,
            slug: p.slug,
            published_at: p.published_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RelatedResponse {
    pub source_id: i64,
    pub items: Vec<RelatedItem>,
}

#[get("/related/<id>?<count>")]
pub fn related(pool: &State<DbPool>, id: i64, count: Option<usize>) -> Result<Json<RelatedResponse>, ApiError> {
    let default_count =
        Setting::get_i64_or(pool, "related_posts_count", DEFAULT_RELATED_COUNT as i64).max(0) as usize;
    let request = RelatedRequest::new(id).with_count(count.unwrap_or(default_count));

    let store = SqliteStore::new(pool.inner().clone());
    let ids = request.select(&store).map_err(|e| {
        log::error!("Related posts for {} failed: {}", id, e);
        api_error(Status::InternalServerError, "related posts unavailable")
    })?;

    let items = Post::find_in_order(pool, &ids)
        .into_iter()
        .map(RelatedItem::from)
        .collect();

    Ok(Json(RelatedResponse { source_id: id, items }))
}

// ── Table of contents ──────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TocResponse {
    pub entries: Vec<TocEntry>,
    pub html: Option<String>,
    /// Post body with ids on every h2/h3, matching the entry anchors.
    pub content_html: String,
}

#[get("/posts/<id>/toc")]
pub fn post_toc(pool: &State<DbPool>, id: i64) -> Result<Json<TocResponse>, ApiError> {
    let post = Post::find_by_id(pool, id).ok_or_else(|| api_error(Status::NotFound, "post not found"))?;
    let min_headings = Setting::get_i64_or(pool, "toc_min_headings", 2).max(0) as usize;

    let toc = Toc::extract(&post.content_html);
    let html = toc.render_if_enough(min_headings);
    let content_html = add_heading_ids(&post.content_html, &mut HeadingAnchors::new());
    Ok(Json(TocResponse {
        entries: toc.entries,
        html,
        content_html,
    }))
}

// ── Star ratings ───────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RatingSubmit {
    pub rating: f64,
    pub old_rating: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub average: f64,
    pub votes: i64,
    pub summary: Option<String>,
}

#[post("/posts/<id>/rating", format = "json", data = "<form>")]
pub fn rate_post(
    pool: &State<DbPool>,
    id: i64,
    form: Json<RatingSubmit>,
) -> Result<Json<RatingResponse>, ApiError> {
    published_post(pool, id)?;
    let rating = StarRating::submit(pool, id, form.rating, form.old_rating).map_err(|e| {
        log::warn!("Rating for post {} rejected: {}", id, e);
        api_error(Status::BadRequest, &e)
    })?;
    let threshold = Setting::get_i64_or(pool, "rating_votes_display_threshold", 50);

    Ok(Json(RatingResponse {
        average: rating.average(),
        votes: rating.vote_count,
        summary: rating.summary_text(threshold),
    }))
}

// ── Reactions ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReactionItem {
    pub kind: ReactionKind,
    pub label: &'static str,
    pub icon: &'static str,
    pub count: i64,
}

#[get("/posts/<id>/reactions")]
pub fn post_reactions(pool: &State<DbPool>, id: i64) -> Result<Json<Vec<ReactionItem>>, ApiError> {
    published_post(pool, id)?;
    let counts = Reaction::counts(pool, id).map_err(|e| storage_error("Reaction counts", e))?;
    Ok(Json(
        counts
            .into_iter()
            .map(|c| ReactionItem {
                kind: c.kind,
                label: c.kind.label(),
                icon: c.kind.icon(),
                count: c.count,
            })
            .collect(),
    ))
}

#[post("/posts/<id>/reactions/<kind>")]
pub fn react(pool: &State<DbPool>, id: i64, kind: &str) -> Result<Json<Value>, ApiError> {
    let kind = ReactionKind::from_key(kind).ok_or_else(|| api_error(Status::BadRequest, "unknown reaction"))?;
    published_post(pool, id)?;
    let count = Reaction::increment(pool, id, kind).map_err(|e| storage_error("Reaction increment", e))?;
    Ok(Json(json!({ "kind": kind, "count": count })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![related, post_list, post_toc, rate_post, post_reactions, react]
}
