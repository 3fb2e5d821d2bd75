//! Survey row classification and field extraction.

pub mod detail_row;
pub mod survey_parser;

pub use survey_parser::{parse_page, SurveyParser, DEFAULT_ORIGIN};
