mod merge;
mod parser;

pub use merge::apply_suggestion;
pub use parser::{clean_text, extract_priority, extract_tags, parse, ParsedActivity};
