//! Citation linking for generated summaries.
//!
//! Summaries cite capstones with bracketed integers (`[1]`, `[2]`). Markers
//! whose number matches a reference's `citation_index` become links to that
//! capstone; every other byte of the text is left as is.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::model::{Reference, Summary};

/// Detail page of a capstone.
pub fn capstone_href(id: i64) -> String {
    format!("/capstone?id={id}")
}

fn citation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("valid citation regex"))
}

/// Rewrites resolvable `[n]` markers in `text` into links.
///
/// Run it once per render: the output contains the original markers inside
/// the anchors, so a second pass would nest links.
pub fn link_citations(text: &str, references: &[Reference]) -> String {
    // Id 0 never names a capstone; such markers stay text.
    let index: HashMap<u32, i64> = references
        .iter()
        .filter(|r| r.target_id != 0)
        .map(|r| (r.citation_index, r.target_id))
        .collect();

    citation_re()
        .replace_all(text, |caps: &Captures<'_>| {
            let target = caps[1].parse::<u32>().ok().and_then(|n| index.get(&n));
            match target {
                Some(id) => format!(
                    r#"<a href="{}" target="_blank">{}</a>"#,
                    capstone_href(*id),
                    &caps[0]
                ),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// A reference entry ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReference {
    pub citation_index: u32,
    pub title: String,
    pub href: String,
    pub authors: String,
    pub year: Option<i32>,
}

/// Summary body with linked citations plus the linked reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSummary {
    pub body: String,
    pub references: Vec<RenderedReference>,
}

/// Renders a summary for the summary region.
pub fn render_summary(summary: &Summary) -> RenderedSummary {
    RenderedSummary {
        body: link_citations(&summary.body, &summary.references),
        references: summary
            .references
            .iter()
            .map(|r| RenderedReference {
                citation_index: r.citation_index,
                title: r.title.clone(),
                href: capstone_href(r.target_id),
                authors: r.authors.clone(),
                year: r.year,
            })
            .collect(),
    }
}
