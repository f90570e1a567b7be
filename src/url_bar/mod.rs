mod parser;

pub use parser::{build_search_url, parse_input, resolve, UrlBarInput};
