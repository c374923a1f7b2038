// src/handlers/articles.rs

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use regex::Regex;
use serde_json::Value;

use crate::{config::Config, error::AppError, models::article::ArticleSearchParams};

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{8}$").unwrap());

/// Proxy to the news article search API.
///
/// `locations` is `<location1>-<location2>`, `date` is `YYYYMMDD` and is used
/// as the newest publication date.
pub async fn find_article(
    State(config): State<Config>,
    State(http): State<reqwest::Client>,
    Path((locations, date)): Path<(String, String)>,
    Query(params): Query<ArticleSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let (first, second) = split_locations(&locations).ok_or_else(|| {
        AppError::BadRequest("Locations must look like '<location1>-<location2>'".to_string())
    })?;
    if !DATE_RE.is_match(&date) {
        return Err(AppError::BadRequest("Date must be YYYYMMDD".to_string()));
    }

    let page_size = params.page_size.unwrap_or(10).min(100);
    let page = params.page.unwrap_or(0);
    let query = search_query(
        first,
        second,
        &date,
        page,
        page_size,
        config.article_api_key.as_deref(),
    );

    let response = http
        .get(config.article_search_url.clone())
        .query(&query)
        .timeout(config.io_timeout)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::UpstreamFailure(format!(
            "article search returned {}",
            response.status()
        )));
    }

    let mut body: Value = response.json().await?;
    truncate_docs(&mut body, page_size)?;

    Ok(Json(body))
}

/// Splits on the last `-`, so `"Sacramento-and-Davis"` is
/// `("Sacramento-and", "Davis")`.
fn split_locations(locations: &str) -> Option<(&str, &str)> {
    locations
        .rsplit_once('-')
        .filter(|(first, second)| !first.is_empty() && !second.is_empty())
}

fn search_query(
    first: &str,
    second: &str,
    date: &str,
    page: u32,
    page_size: usize,
    api_key: Option<&str>,
) -> Vec<(&'static str, String)> {
    vec![
        ("end_date", date.to_string()),
        (
            "fq",
            format!(
                "timesTag.location.contains:{} OR timesTag.location.contains:{}",
                first, second
            ),
        ),
        ("sort", "newest".to_string()),
        ("api-key", api_key.unwrap_or_default().to_string()),
        ("page", page.to_string()),
        ("pageSize", page_size.to_string()),
    ]
}

/// Keeps at most `page_size` entries of `response.docs`; a missing or null
/// list becomes empty.
fn truncate_docs(body: &mut Value, page_size: usize) -> Result<(), AppError> {
    let Some(root) = body.as_object_mut() else {
        return Err(AppError::UpstreamFailure(
            "article search returned a non-object payload".to_string(),
        ));
    };

    let response = root
        .entry("response")
        .or_insert_with(|| Value::Object(Default::default()));
    let Some(response) = response.as_object_mut() else {
        return Err(AppError::UpstreamFailure(
            "article search returned a malformed response field".to_string(),
        ));
    };

    let docs: Vec<Value> = response
        .get("docs")
        .and_then(Value::as_array)
        .map(|docs| docs.iter().take(page_size).cloned().collect())
        .unwrap_or_default();
    response.insert("docs".to_string(), Value::Array(docs));

    Ok(())
}
