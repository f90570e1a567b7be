use crate::config;
use crate::settings::Settings;
use url::Url;

/// Result of parsing URL bar input
pub enum UrlBarInput {
    /// A URL to navigate to
    Url(Url),
    /// A search query for the configured engine
    Search(String),
    /// Empty or unparseable input; nothing to load
    Empty,
}

/// Parse user input from the URL bar
///
/// Rules:
/// 1. Empty input (after trimming) loads nothing
/// 2. Input containing a scheme separator (`://`) is a URL, taken verbatim
/// 3. Input containing a dot and no whitespace is a bare domain; prepend https://
/// 4. Everything else is a search query
pub fn parse_input(input: &str) -> UrlBarInput {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return UrlBarInput::Empty;
    }

    // With an explicit scheme separator the text is always an address, never
    // a search. Text that still fails to parse loads nothing.
    if trimmed.contains("://") {
        return match Url::parse(trimmed) {
            Ok(url) => UrlBarInput::Url(url),
            Err(_) => UrlBarInput::Empty,
        };
    }

    // Bare-domain heuristic. A dot with embedded whitespace ("example. com")
    // stays a search.
    if trimmed.contains('.') && !trimmed.chars().any(char::is_whitespace) {
        return match Url::parse(&format!("https://{}", trimmed)) {
            Ok(url) => UrlBarInput::Url(url),
            Err(_) => UrlBarInput::Empty,
        };
    }

    UrlBarInput::Search(trimmed.to_string())
}

/// Build a search URL for the given query using the configured engine.
/// The query is percent-encoded and substituted for the template's
/// placeholder; a template without the placeholder passes through unchanged.
pub fn build_search_url(query: &str, settings: &Settings) -> Result<Url, url::ParseError> {
    let encoded = urlencoding::encode(query);
    let url_str = settings
        .search_template()
        .replace(config::SEARCH_PLACEHOLDER, &encoded);
    Url::parse(&url_str)
}

/// Resolve raw address-bar text into a loadable URL, if any
pub fn resolve(input: &str, settings: &Settings) -> Option<Url> {
    match parse_input(input) {
        UrlBarInput::Url(url) => Some(url),
        UrlBarInput::Search(query) => match build_search_url(&query, settings) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Unusable search template for query {:?}: {}", query, e);
                None
            }
        },
        UrlBarInput::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SearchEngine;

    fn settings_with(engine: SearchEngine, template: &str) -> Settings {
        let mut settings = Settings::default();
        settings.search_engine = engine;
        settings.custom_template = template.to_string();
        settings
    }

    #[test]
    fn test_full_url() {
        match parse_input("https://example.com") {
            UrlBarInput::Url(url) => assert_eq!(url.as_str(), "https://example.com/"),
            _ => panic!("Expected URL"),
        }
    }

    #[test]
    fn test_scheme_is_preserved() {
        match parse_input("http://example.com/a?b=1") {
            UrlBarInput::Url(url) => assert_eq!(url.as_str(), "http://example.com/a?b=1"),
            _ => panic!("Expected URL"),
        }
    }

    #[test]
    fn test_unusual_scheme_is_still_a_url() {
        match parse_input("ftp://host/file") {
            UrlBarInput::Url(url) => assert_eq!(url.scheme(), "ftp"),
            _ => panic!("Expected URL"),
        }
    }

    #[test]
    fn test_separator_never_searches() {
        // Unparseable, but carries "://" so it must not become a query
        match parse_input("what is :// for") {
            UrlBarInput::Empty => {}
            _ => panic!("Expected no navigation"),
        }
    }

    #[test]
    fn test_domain_without_scheme() {
        match parse_input("openai.com") {
            UrlBarInput::Url(url) => assert_eq!(url.as_str(), "https://openai.com/"),
            _ => panic!("Expected URL"),
        }
    }

    #[test]
    fn test_domain_with_path() {
        match parse_input("github.com/user/repo") {
            UrlBarInput::Url(url) => assert_eq!(url.as_str(), "https://github.com/user/repo"),
            _ => panic!("Expected URL"),
        }
    }

    #[test]
    fn test_dot_with_whitespace_is_a_search() {
        match parse_input("example. com") {
            UrlBarInput::Search(query) => assert_eq!(query, "example. com"),
            _ => panic!("Expected search"),
        }
    }

    #[test]
    fn test_search_query() {
        match parse_input("rust programming") {
            UrlBarInput::Search(query) => assert_eq!(query, "rust programming"),
            _ => panic!("Expected search"),
        }
    }

    #[test]
    fn test_single_word_is_a_search() {
        // No dot, so the bare-domain heuristic does not apply
        match parse_input("localhost") {
            UrlBarInput::Search(query) => assert_eq!(query, "localhost"),
            _ => panic!("Expected search"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_input(""), UrlBarInput::Empty));
        assert!(matches!(parse_input("   "), UrlBarInput::Empty));
    }

    #[test]
    fn test_search_url_google() {
        let settings = settings_with(SearchEngine::Google, "");
        let url = build_search_url("weather today", &settings).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/search?q=weather%20today"
        );
    }

    #[test]
    fn test_search_url_duckduckgo() {
        let settings = settings_with(SearchEngine::DuckDuckGo, "");
        let url = build_search_url("weather today", &settings).unwrap();
        assert_eq!(url.as_str(), "https://duckduckgo.com/?q=weather%20today");
    }

    #[test]
    fn test_search_url_bing() {
        let settings = settings_with(SearchEngine::Bing, "");
        let url = build_search_url("weather today", &settings).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.bing.com/search?q=weather%20today"
        );
    }

    #[test]
    fn test_custom_template_substitution() {
        let settings = settings_with(SearchEngine::Custom, "https://search.example/?q=%s&x=1");
        let url = build_search_url("rust lang", &settings).unwrap();
        assert_eq!(url.as_str(), "https://search.example/?q=rust%20lang&x=1");
    }

    #[test]
    fn test_custom_template_without_placeholder() {
        // Substitution has nothing to replace; the template comes back as-is
        let settings = settings_with(SearchEngine::Custom, "https://search.example/fixed");
        let url = build_search_url("anything", &settings).unwrap();
        assert_eq!(url.as_str(), "https://search.example/fixed");
    }

    #[test]
    fn test_query_encoding() {
        let settings = settings_with(SearchEngine::Google, "");
        let url = build_search_url("c++ & rust?", &settings).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google.com/search?q=c%2B%2B%20%26%20rust%3F"
        );
    }

    #[test]
    fn test_resolve_examples() {
        let settings = settings_with(SearchEngine::Google, "");
        assert_eq!(
            resolve("openai.com", &settings).unwrap().as_str(),
            "https://openai.com/"
        );
        assert_eq!(
            resolve("weather today", &settings).unwrap().as_str(),
            "https://www.google.com/search?q=weather%20today"
        );
        assert!(resolve("", &settings).is_none());
    }
}
