use url::form_urlencoded;

pub const DEFAULT_SEARCH_BASE: &str = "https://www.google.com/search";

/// Results per search-engine page; page `i` starts at offset `i * 10`.
pub const RESULTS_PER_PAGE: usize = 10;

/// Builds result-page URLs for a query against a search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchUrlBuilder {
    base: String,
}

impl Default for SearchUrlBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_BASE)
    }
}

impl SearchUrlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of the zero-based result page `page` for `query`.
    ///
    /// Page 0 carries no offset parameter; later pages add
    /// `&start=page*10`. The query is form-encoded.
    pub fn build_url(&self, query: &str, page: usize) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        if page == 0 {
            format!("{}?q={encoded}", self.base)
        } else {
            format!(
                "{}?q={encoded}&start={}",
                self.base,
                page * RESULTS_PER_PAGE
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_has_no_offset() {
        let urls = SearchUrlBuilder::default();
        assert_eq!(
            urls.build_url("rust", 0),
            "https://www.google.com/search?q=rust"
        );
    }

    #[test]
    fn later_pages_step_by_ten() {
        let urls = SearchUrlBuilder::default();
        assert!(urls.build_url("rust", 1).ends_with("&start=10"));
        assert!(urls.build_url("rust", 4).ends_with("&start=40"));
    }

    #[test]
    fn query_is_form_encoded() {
        let urls = SearchUrlBuilder::new("http://search.test/s");
        assert_eq!(
            urls.build_url("capital of France?", 2),
            "http://search.test/s?q=capital+of+France%3F&start=20"
        );
        assert_eq!(
            urls.build_url("a&b=c", 0),
            "http://search.test/s?q=a%26b%3Dc"
        );
    }
}
