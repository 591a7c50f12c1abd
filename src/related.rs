//! Related-post selection.
//!
//! Posts are picked through four tiers, strongest signal first:
//! exact tags, similar tags, shared category, then the newest posts on the
//! site. Each tier only asks for what is still missing and never returns a
//! post an earlier tier already picked (or the source post itself).

use std::collections::HashSet;

use log::debug;

use crate::models::tag::Tag;
use crate::store::{ContentRepository, Direction, OrderBy, PostQuery, TaxonomyDirectory};

pub const DEFAULT_RELATED_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedRequest {
    pub source_id: i64,
    pub desired_count: usize,
}

impl RelatedRequest {
    pub fn new(source_id: i64) -> Self {
        RelatedRequest {
            source_id,
            desired_count: DEFAULT_RELATED_COUNT,
        }
    }

    pub fn with_count(mut self, desired_count: usize) -> Self {
        self.desired_count = desired_count;
        self
    }

    pub fn select<S>(&self, store: &S) -> Result<Vec<i64>, String>
    where
        S: ContentRepository + TaxonomyDirectory + ?Sized,
    {
        select_related(store, self.source_id, self.desired_count)
    }
}

/// Ids picked so far, plus everything later tiers must skip.
#[derive(Debug, Clone)]
struct Collected {
    found: Vec<i64>,
    excluded: Vec<i64>,
    wanted: usize,
}

impl Collected {
    fn new(source_id: i64, wanted: usize) -> Self {
        Collected {
            found: Vec::new(),
            excluded: vec![source_id],
            wanted,
        }
    }

    fn remaining(&self) -> usize {
        self.wanted.saturating_sub(self.found.len())
    }

    fn is_full(&self) -> bool {
        self.remaining() == 0
    }

    /// Append ids in order, ignoring anything already excluded and
    /// anything past the wanted count.
    fn absorb(mut self, ids: Vec<i64>) -> Self {
        for id in ids {
            if self.is_full() {
                break;
            }
            if self.excluded.contains(&id) {
                continue;
            }
            self.found.push(id);
            self.excluded.push(id);
        }
        self
    }

    fn query(&self) -> PostQuery {
        PostQuery::published(self.remaining()).excluding(&self.excluded)
    }

    fn finish(self) -> Vec<i64> {
        let mut seen = HashSet::new();
        let mut out: Vec<i64> = self.found.into_iter().filter(|id| seen.insert(*id)).collect();
        out.truncate(self.wanted);
        out
    }
}

/// Pick up to `desired_count` posts related to `source_id`, best first.
///
/// A short (or empty) result is not an error; it only means the site ran
/// out of candidates. Repository failures are returned as-is.
pub fn select_related<S>(store: &S, source_id: i64, desired_count: usize) -> Result<Vec<i64>, String>
where
    S: ContentRepository + TaxonomyDirectory + ?Sized,
{
    if desired_count == 0 {
        return Ok(Vec::new());
    }

    let acc = Collected::new(source_id, desired_count);
    let source_tags = store.tags_for_post(source_id)?;

    let acc = exact_tag_tier(store, &source_tags, acc)?;
    let acc = similar_tag_tier(store, &source_tags, acc)?;
    let acc = category_tier(store, source_id, acc)?;
    let acc = recent_tier(store, acc)?;

    let result = acc.finish();
    debug!("Related posts for {}: {:?}", source_id, result);
    Ok(result)
}

fn exact_tag_tier<S>(store: &S, source_tags: &[Tag], acc: Collected) -> Result<Collected, String>
where
    S: ContentRepository + ?Sized,
{
    if acc.is_full() || source_tags.is_empty() {
        return Ok(acc);
    }
    let tag_ids: Vec<i64> = source_tags.iter().map(|t| t.id).collect();
    let ids = store.query_post_ids(&acc.query().with_tags(&tag_ids))?;
    debug!("Exact-tag tier returned {} posts", ids.len());
    Ok(acc.absorb(ids))
}

fn similar_tag_tier<S>(store: &S, source_tags: &[Tag], acc: Collected) -> Result<Collected, String>
where
    S: ContentRepository + TaxonomyDirectory + ?Sized,
{
    if acc.is_full() || source_tags.is_empty() {
        return Ok(acc);
    }
    let site_tags = store.all_tags()?;
    let similar = similar_tag_ids(source_tags, &site_tags);
    if similar.is_empty() {
        return Ok(acc);
    }
    let ids = store.query_post_ids(&acc.query().with_tags(&similar))?;
    debug!(
        "Similar-tag tier ({} tags) returned {} posts",
        similar.len(),
        ids.len()
    );
    Ok(acc.absorb(ids))
}

fn category_tier<S>(store: &S, source_id: i64, acc: Collected) -> Result<Collected, String>
where
    S: ContentRepository + TaxonomyDirectory + ?Sized,
{
    if acc.is_full() {
        return Ok(acc);
    }
    let category_ids = store.category_ids_for_post(source_id)?;
    if category_ids.is_empty() {
        return Ok(acc);
    }
    let query = acc
        .query()
        .with_categories(&category_ids)
        .order(OrderBy::PublishedAt, Direction::Desc);
    let ids = store.query_post_ids(&query)?;
    debug!("Category tier returned {} posts", ids.len());
    Ok(acc.absorb(ids))
}

fn recent_tier<S>(store: &S, acc: Collected) -> Result<Collected, String>
where
    S: ContentRepository + ?Sized,
{
    if acc.is_full() {
        return Ok(acc);
    }
    let query = acc.query().order(OrderBy::PublishedAt, Direction::Desc);
    let ids = store.query_post_ids(&query)?;
    debug!("Recent-posts tier returned {} posts", ids.len());
    Ok(acc.absorb(ids))
}

/// Site tags that look like a source tag without being one of them.
///
/// Matching is case-insensitive on whole whitespace-separated words:
/// a multi-word tag matches single-word tags equal to one of its words and
/// other multi-word tags sharing a word; a single-word tag matches
/// multi-word tags containing it. Two single-word tags never match.
pub fn similar_tag_ids(source_tags: &[Tag], site_tags: &[Tag]) -> Vec<i64> {
    let source_ids: HashSet<i64> = source_tags.iter().map(|t| t.id).collect();
    let mut seen: HashSet<i64> = HashSet::new();
    let mut similar = Vec::new();

    for source in source_tags {
        let source_words = source.words();
        if source_words.is_empty() {
            continue;
        }
        for candidate in site_tags {
            if source_ids.contains(&candidate.id) || seen.contains(&candidate.id) {
                continue;
            }
            let candidate_words = candidate.words();
            if words_overlap(&source_words, &candidate_words) {
                seen.insert(candidate.id);
                similar.push(candidate.id);
            }
        }
    }

    similar
}

fn words_overlap(source: &[String], candidate: &[String]) -> bool {
    match (source.len(), candidate.len()) {
        (0, _) | (_, 0) | (1, 1) => false,
        (_, 1) => source.contains(&candidate[0]),
        (1, _) => candidate.contains(&source[0]),
        _ => source.iter().any(|w| candidate.contains(w)),
    }
}
