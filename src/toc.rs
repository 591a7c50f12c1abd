//! Heading anchors and the table of contents built from them.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<h([23])(\s[^>]*)?>(.*?)</h([23])\s*>").expect("Invalid heading regex")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid tag regex"));

static ID_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bid\s*=\s*["']"#).expect("Invalid id attribute regex"));

/// Hands out unique anchors for one rendered document.
/// Repeats of the same slug become `slug-2`, `slug-3`, ...
#[derive(Debug, Default)]
pub struct HeadingAnchors {
    seen: HashMap<String, usize>,
}

impl HeadingAnchors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor_for(&mut self, title: &str) -> String {
        let mut base = slug::slugify(title);
        if base.is_empty() {
            base = "section".to_string();
        }
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{}-{}", base, count)
        }
    }
}

fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").trim().to_string()
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// `(level, attrs, inner)` for a well-formed h2/h3, `None` when the
/// closing tag does not match the opening one.
fn heading_parts<'h>(caps: &Captures<'h>) -> Option<(u8, &'h str, &'h str)> {
    let open = caps.get(1)?.as_str();
    let close = caps.get(4)?.as_str();
    if open != close {
        return None;
    }
    let level = open.parse().ok()?;
    let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let inner = caps.get(3).map(|m| m.as_str()).unwrap_or("");
    Some((level, attrs, inner))
}

/// Give every h2/h3 an `id` so TOC links have somewhere to land.
/// Headings that already carry an id keep it.
pub fn add_heading_ids(html: &str, anchors: &mut HeadingAnchors) -> String {
    HEADING
        .replace_all(html, |caps: &Captures| {
            let Some((level, attrs, inner)) = heading_parts(caps) else {
                return caps[0].to_string();
            };
            let anchor = anchors.anchor_for(&strip_tags(inner));
            if ID_ATTR.is_match(attrs) {
                return caps[0].to_string();
            }
            format!("<h{level}{attrs} id=\"{anchor}\">{inner}</h{level}>")
        })
        .into_owned()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    pub anchor: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Toc {
    pub entries: Vec<TocEntry>,
}

impl Toc {
    /// Collect h2/h3 headings with the same anchors `add_heading_ids`
    /// assigns on a fresh `HeadingAnchors`.
    pub fn extract(html: &str) -> Self {
        let mut anchors = HeadingAnchors::new();
        let entries = HEADING
            .captures_iter(html)
            .filter_map(|caps| {
                let (level, _, inner) = heading_parts(&caps)?;
                let title = strip_tags(inner);
                let anchor = anchors.anchor_for(&title);
                Some(TocEntry {
                    level,
                    title,
                    anchor,
                })
            })
            .collect();
        Toc { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nested `<ol>` navigation; h3 entries nest under the preceding h2.
    pub fn render_html(&self) -> String {
        let mut html = String::from(
            "<nav class=\"toc\" aria-label=\"Table of Contents\"><ol class=\"toc-list\">",
        );
        let mut item_open = false;
        let mut sub_open = false;

        for entry in &self.entries {
            let link = format!(
                "<a href=\"#{}\" title=\"Go to {} section\">{}</a>",
                html_escape(&entry.anchor),
                html_escape(&entry.title),
                html_escape(&entry.title)
            );
            if entry.level > 2 && item_open {
                if !sub_open {
                    html.push_str("<ol>");
                    sub_open = true;
                }
                html.push_str("<li>");
                html.push_str(&link);
                html.push_str("</li>");
                continue;
            }
            if sub_open {
                html.push_str("</ol>");
                sub_open = false;
            }
            if item_open {
                html.push_str("</li>");
            }
            html.push_str("<li>");
            html.push_str(&link);
            item_open = true;
        }

        if sub_open {
            html.push_str("</ol>");
        }
        if item_open {
            html.push_str("</li>");
        }
        html.push_str("</ol></nav>");
        html
    }

    /// Rendered TOC, or `None` when there are fewer than `min_headings`.
    pub fn render_if_enough(&self, min_headings: usize) -> Option<String> {
        if self.is_empty() || self.len() < min_headings {
            return None;
        }
        Some(self.render_html())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_titles_get_numbered_anchors() {
        let mut anchors = HeadingAnchors::new();
        assert_eq!(anchors.anchor_for("Setup"), "setup");
        assert_eq!(anchors.anchor_for("Setup"), "setup-2");
        assert_eq!(anchors.anchor_for("Other"), "other");
        assert_eq!(anchors.anchor_for("Setup"), "setup-3");
    }

    #[test]
    fn separate_counters_do_not_share_state() {
        let mut first = HeadingAnchors::new();
        first.anchor_for("Intro");
        let mut second = HeadingAnchors::new();
        assert_eq!(second.anchor_for("Intro"), "intro");
    }

    #[test]
    fn ids_added_and_existing_ids_kept() {
        let html = "<h2>Intro</h2><p>x</p><h3 class=\"s\">Intro</h3><h2 id=\"keep\">Kept</h2><h4>Skip</h4>";
        let out = add_heading_ids(html, &mut HeadingAnchors::new());
        assert!(out.contains("<h2 id=\"intro\">Intro</h2>"));
        assert!(out.contains("<h3 class=\"s\" id=\"intro-2\">Intro</h3>"));
        assert!(out.contains("<h2 id=\"keep\">Kept</h2>"));
        assert!(out.contains("<h4>Skip</h4>"));
    }

    #[test]
    fn toc_titles_are_plain_text() {
        let toc = Toc::extract("<h2><strong>Bold</strong> move</h2><h2>Two</h2>");
        assert_eq!(toc.entries[0].title, "Bold move");
        assert_eq!(toc.entries[0].anchor, "bold-move");
        assert_eq!(toc.entries[1].anchor, "two");
    }

    #[test]
    fn toc_nests_h3_under_h2() {
        let toc = Toc::extract("<h2>A</h2><h3>A1</h3><h3>A2</h3><h2>B</h2>");
        let html = toc.render_html();
        assert!(html.contains(
            "<li><a href=\"#a\" title=\"Go to A section\">A</a><ol><li><a href=\"#a1\" title=\"Go to A1 section\">A1</a></li>"
        ));
        assert!(html.contains("</ol></li><li><a href=\"#b\""));
        assert!(html.ends_with("</li></ol></nav>"));
    }

    #[test]
    fn toc_needs_minimum_headings() {
        let toc = Toc::extract("<h2>Only</h2>");
        assert_eq!(toc.render_if_enough(2), None);
        assert!(toc.render_if_enough(1).is_some());
    }

    #[test]
    fn toc_and_heading_ids_agree() {
        let html = "<h2>Same</h2><h2>Same</h2>";
        let toc = Toc::extract(html);
        let with_ids = add_heading_ids(html, &mut HeadingAnchors::new());
        for entry in &toc.entries {
            assert!(with_ids.contains(&format!("id=\"{}\"", entry.anchor)));
        }
    }
}
