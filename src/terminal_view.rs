//! Renders the search page to stdout.

use std::sync::OnceLock;

use colored::Colorize;
use regex::{Captures, Regex};
use search_session::{
    PageControl, RenderedSummary, SearchPage, SearchView, SessionError, truncate_words,
};

const SNIPPET_WORDS: usize = 30;

/// Stdout-backed [`SearchView`]. Relative links are printed against `base_url`.
#[derive(Debug, Clone)]
pub struct TerminalView {
    base_url: String,
}

impl TerminalView {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn absolute(&self, href: &str) -> String {
        format!("{}{}", self.base_url, href)
    }
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<a href="[^"]*" target="_blank">(\[\d+\])</a>"#).expect("valid anchor regex")
    })
}

/// Terminal form of a linked summary body: anchors become highlighted markers.
fn terminal_body(html: &str) -> String {
    anchor_re()
        .replace_all(html, |caps: &Captures<'_>| caps[1].cyan().underline().to_string())
        .into_owned()
}

fn pagination_line(controls: &[PageControl]) -> String {
    controls
        .iter()
        .map(|c| {
            if c.active {
                format!("[{}]", c.page).bold().to_string()
            } else {
                c.page.to_string().dimmed().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl SearchView for TerminalView {
    fn set_title(&self, title: &str) {
        println!("\n{}", title.bold());
    }

    fn set_location(&self, location: &str) {
        println!("{}", self.absolute(location).dimmed());
    }

    fn show_fetching(&self) {
        println!("{}", "Fetching results...".dimmed());
    }

    fn show_results(&self, _query: &str, results: &SearchPage) {
        let offset = (results.page.saturating_sub(1) * results.per_page) as usize;
        for (i, hit) in results.hits.iter().enumerate() {
            println!(
                "{:>3}. {} {}",
                offset + i + 1,
                hit.title.bold(),
                format!("({}% match)", hit.similarity_percent()).green()
            );
            println!("     {}", self.absolute(&search_session::capstone_href(hit.id)).dimmed());
            if !hit.snippet.is_empty() {
                println!("     {}", truncate_words(&hit.snippet, SNIPPET_WORDS));
            }
        }
    }

    fn show_no_results(&self) {
        println!("No results found.");
    }

    fn show_pagination(&self, controls: &[PageControl]) {
        if controls.len() > 1 {
            println!("Pages: {}", pagination_line(controls));
        }
    }

    fn show_search_error(&self, error: &SessionError) {
        println!("{} {}", "Search failed:".red().bold(), error);
    }

    fn hide_summary(&self) {}

    fn show_summary_loading(&self) {
        println!("\n{}", "Generating summary...".dimmed());
    }

    fn show_summary(&self, summary: &RenderedSummary) {
        println!("\n{}", "Summary".bold().underline());
        println!("{}", terminal_body(&summary.body));
        if !summary.references.is_empty() {
            println!("\n{}", "References".bold());
        }
        for r in &summary.references {
            let year = r.year.map(|y| format!(" ({y})")).unwrap_or_default();
            let authors = if r.authors.is_empty() {
                String::new()
            } else {
                format!(" - {}", r.authors)
            };
            println!("  [{}] {}{}{}", r.citation_index, r.title, authors, year);
            println!("      {}", self.absolute(&r.href).dimmed());
        }
    }

    fn show_summary_error(&self, error: &SessionError) {
        let msg = match error {
            SessionError::Timeout(_) => "Summary timed out.".to_string(),
            other => format!("Summary unavailable: {other}"),
        };
        println!("\n{}", msg.yellow());
    }
}
