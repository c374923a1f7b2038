use serde::Deserialize;

/// Query parameters for the article search proxy.
#[derive(Debug, Deserialize)]
pub struct ArticleSearchParams {
    /// Number of docs to return (default: 10, max: 100).
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,

    /// Upstream page number, starting at 0.
    pub page: Option<u32>,
}
