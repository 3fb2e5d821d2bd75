//! Survey pagination helpers.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static PAGE_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\?page=(\d+)").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Highest page number linked from a survey page, or 1 when there is no pagination.
pub fn last_page_number(html: &str) -> u32 {
    Html::parse_document(html)
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| PAGE_PARAM_RE.captures(href))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .fold(1, u32::max)
}

/// URL of survey page `page` (page 1 is the base url itself).
pub fn page_url(base_url: &str, page: u32) -> String {
    if page <= 1 {
        base_url.to_string()
    } else {
        format!("{base_url}?page={page}")
    }
}
