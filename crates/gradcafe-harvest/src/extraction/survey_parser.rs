//! Turn one survey page into raw applicant records.
//!
//! The results table interleaves two kinds of rows. A five-cell main row
//! opens a new applicant; single-cell detail rows that follow carry scores,
//! term, nationality and free-text comments for that applicant. Rows are
//! tagged once by cell count and fed through a two-state automaton:
//!
//! ```text
//! AwaitingMain --main--> Accumulating(record) --detail--> Accumulating(record)
//!                        Accumulating(record) --main----> emit, Accumulating(new)
//!                        Accumulating(record) --EOF-----> emit
//! ```

use super::detail_row::apply_detail_row;
use crate::types::{DegreeBucket, RawRecord};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Origin used to absolutize relative result links.
pub const DEFAULT_ORIGIN: &str = "https://www.thegradcafe.com";

static RESULT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/result/").unwrap());

/// Markup of the first table, up to its close tag or the end of input.
static TABLE_MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b.*?(?:</table\s*>|\z)").unwrap());
static TBODY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<tbody\b").unwrap());

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static TBODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Row kind, derived from the number of `<td>` cells.
enum RowKind<'a> {
    Main(Vec<ElementRef<'a>>),
    Detail(ElementRef<'a>),
    Ignored,
}

impl<'a> RowKind<'a> {
    fn of(row: ElementRef<'a>) -> Self {
        let mut cells: Vec<ElementRef<'a>> = row.select(&CELL).collect();
        match cells.len() {
            5 => RowKind::Main(cells),
            1 => RowKind::Detail(cells.remove(0)),
            _ => RowKind::Ignored,
        }
    }
}

enum ParserState {
    AwaitingMain,
    Accumulating(RawRecord),
}

/// Survey page parser bound to a site origin.
#[derive(Debug, Clone)]
pub struct SurveyParser {
    origin: Option<Url>,
}

impl Default for SurveyParser {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN)
    }
}

impl SurveyParser {
    /// Create a parser that resolves relative result links against `origin`.
    pub fn new(origin: &str) -> Self {
        Self {
            origin: Url::parse(origin).ok(),
        }
    }

    /// Parse all applicant records from a survey page.
    ///
    /// A page without a table, or a table without a body section, yields no
    /// records. This never fails.
    pub fn parse(&self, html: &str) -> Vec<RawRecord> {
        // html5ever wraps bare rows in a tbody, so the body check runs on the markup.
        if !declares_table_body(html) {
            return Vec::new();
        }
        let document = Html::parse_document(html);
        let Some(table) = document.select(&TABLE).next() else {
            return Vec::new();
        };
        let Some(tbody) = table.select(&TBODY).next() else {
            return Vec::new();
        };

        let mut records = Vec::new();
        let mut state = ParserState::AwaitingMain;

        for row in tbody.select(&ROW) {
            state = match (RowKind::of(row), state) {
                (RowKind::Main(cells), ParserState::Accumulating(done)) => {
                    records.push(done);
                    ParserState::Accumulating(self.parse_main_row(&cells))
                }
                (RowKind::Main(cells), ParserState::AwaitingMain) => {
                    ParserState::Accumulating(self.parse_main_row(&cells))
                }
                (RowKind::Detail(cell), ParserState::Accumulating(mut record)) => {
                    apply_detail_row(&cell_text(cell, " | "), &mut record);
                    ParserState::Accumulating(record)
                }
                (RowKind::Detail(_) | RowKind::Ignored, state) => state,
            };
        }

        if let ParserState::Accumulating(last) = state {
            records.push(last);
        }

        records
    }

    fn parse_main_row(&self, cells: &[ElementRef<'_>]) -> RawRecord {
        let institution = cell_text(cells[0], "");

        let program_cell = cell_text(cells[1], " | ");
        let mut program_parts = program_cell.split(" | ");
        let program_name = program_parts.next().unwrap_or("").to_string();
        let degree = program_parts.next().map(DegreeBucket::from_text);

        RawRecord {
            url: self.result_url(cells[4]),
            program_text: format!("{program_name}, {institution}"),
            institution,
            degree,
            date_added: format!("Added on {}", cell_text(cells[2], "")),
            status: cell_text(cells[3], ""),
            ..Default::default()
        }
    }

    fn result_url(&self, cell: ElementRef<'_>) -> Option<String> {
        let href = cell
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| RESULT_LINK_RE.is_match(href))?;

        if Url::parse(href).is_ok() {
            return Some(href.to_string());
        }
        match &self.origin {
            Some(origin) => origin.join(href).ok().map(|u| u.to_string()),
            None => Some(href.to_string()),
        }
    }
}

/// Parse a survey page using the default site origin.
pub fn parse_page(html: &str) -> Vec<RawRecord> {
    SurveyParser::default().parse(html)
}

fn declares_table_body(html: &str) -> bool {
    TABLE_MARKUP_RE
        .find(html)
        .is_some_and(|table| TBODY_TAG_RE.is_match(table.as_str()))
}

/// Text nodes of an element, each trimmed, empties dropped, joined by `separator`.
fn cell_text(cell: ElementRef<'_>, separator: &str) -> String {
    cell.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
<html><body>
<table>
<tbody>
  <tr>
    <td>Stanford University</td>
    <td><span>Computer Science</span><span>PhD</span></td>
    <td>January 15, 2026</td>
    <td>Accepted</td>
    <td><a href="/result/11111">View</a></td>
  </tr>
  <tr>
    <td><div>Fall 2026</div><div>American</div><div>GPA 3.85</div><div>GRE 320</div><div>GRE V 160</div><div>GRE AW 4.5</div></td>
  </tr>
  <tr>
    <td>Very happy with this result!</td>
  </tr>
  <tr>
    <td>MIT</td>
    <td>Electrical Engineering | Masters</td>
    <td>February 1, 2026</td>
    <td>Rejected</td>
    <td><a href="/result/22222">View</a></td>
  </tr>
  <tr>
    <td>Spring 2026 | International | GPA 3.60 | GRE AW 4.0</td>
  </tr>
</tbody>
</table>
</body></html>
"#;

    #[test]
    fn test_parse_sample_page() {
        let records = parse_page(SAMPLE_HTML);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.program_text, "Computer Science, Stanford University");
        assert_eq!(first.institution, "Stanford University");
        assert_eq!(first.degree, Some(DegreeBucket::PhD));
        assert_eq!(first.date_added, "Added on January 15, 2026");
        assert_eq!(first.status, "Accepted");
        assert_eq!(
            first.url.as_deref(),
            Some("https://www.thegradcafe.com/result/11111")
        );
        assert_eq!(first.term, "Fall 2026");
        assert_eq!(first.gre_aw, "GRE AW 4.5");
        assert_eq!(first.gre, "GRE 320");
        assert_eq!(first.comments, vec!["Very happy with this result!".to_string()]);

        let second = &records[1];
        assert_eq!(second.degree, Some(DegreeBucket::Masters));
        assert_eq!(second.nationality, "International");
        assert_eq!(second.gre_aw, "GRE AW 4.0");
        assert!(second.gre.is_empty());
    }

    #[test]
    fn test_consecutive_main_rows_are_independent() {
        let html = r#"<table><tbody>
            <tr><td>A</td><td>Physics | PhD</td><td>d</td><td>s</td><td></td></tr>
            <tr><td>B</td><td>Chemistry | JD</td><td>d</td><td>s</td><td></td></tr>
        </tbody></table>"#;
        let records = parse_page(html);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.gpa.is_empty());
            assert!(record.gre.is_empty());
            assert!(record.gre_v.is_empty());
            assert!(record.gre_aw.is_empty());
            assert!(record.comments.is_empty());
            assert!(record.url.is_none());
        }
        assert_eq!(records[1].degree, Some(DegreeBucket::Other("JD".into())));
    }

    #[test]
    fn test_missing_structure_yields_nothing() {
        assert!(parse_page("<html><body><p>no table</p></body></html>").is_empty());
        assert!(parse_page("<table></table>").is_empty());
        assert!(parse_page("<table><thead><tr><th>School</th></tr></thead></table>").is_empty());
        assert!(parse_page("").is_empty());
    }

    #[test]
    fn test_table_without_tbody_yields_nothing() {
        let html = r#"<table>
            <tr><td>A</td><td>Physics | PhD</td><td>d</td><td>s</td><td><a href="/result/1">x</a></td></tr>
            <tr><td>Fall 2026 | American</td></tr>
        </table>"#;
        assert!(parse_page(html).is_empty());

        let upper = r#"<TABLE><TBODY>
            <TR><TD>A</TD><TD>Physics | PhD</TD><TD>d</TD><TD>s</TD><TD></TD></TR>
        </TBODY></TABLE>"#;
        assert_eq!(parse_page(upper).len(), 1);
    }

    #[test]
    fn test_detail_before_any_main_row_is_ignored() {
        let html = r#"<table><tbody>
            <tr><td>orphan comment</td></tr>
            <tr><td>a</td><td>b</td></tr>
            <tr><td>A</td><td>Physics</td><td>d</td><td>s</td><td></td></tr>
        </tbody></table>"#;
        let records = parse_page(html);
        assert_eq!(records.len(), 1);
        assert!(records[0].comments.is_empty());
        assert_eq!(records[0].degree, None);
    }

    #[test]
    fn test_result_links() {
        let html = r#"<table><tbody>
            <tr><td>A</td><td>P</td><td>d</td><td>s</td><td><a href="https://other.example.com/result/abc">x</a></td></tr>
            <tr><td>B</td><td>P</td><td>d</td><td>s</td><td><a href="/profile/9">x</a></td></tr>
            <tr><td>C</td><td>P</td><td>d</td><td>s</td><td><a href="/">home</a><a href="/result/7">x</a></td></tr>
        </tbody></table>"#;
        let records = SurveyParser::new("http://localhost:9000").parse(html);
        assert_eq!(
            records[0].url.as_deref(),
            Some("https://other.example.com/result/abc")
        );
        assert_eq!(records[1].url, None);
        assert_eq!(records[2].url.as_deref(), Some("http://localhost:9000/result/7"));
    }
}
