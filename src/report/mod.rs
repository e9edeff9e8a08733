pub mod json;
pub mod markdown;

pub use json::{read_compliance, write_json};
pub use markdown::MarkdownReport;
