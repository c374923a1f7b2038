// src/config.rs

use std::{env, time::Duration};
use dotenvy::dotenv;
use url::Url;

const DEFAULT_ARTICLE_SEARCH_URL: &str = "https://api.nytimes.com/svc/search/v2/articlesearch.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    /// Required when `store_backend` is Postgres.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub moderator_name: String,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub article_search_url: Url,
    pub article_api_key: Option<String>,
    pub io_timeout: Duration,
    pub max_write_retries: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => panic!("STORE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            panic!("DATABASE_URL must be set");
        }

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let moderator_name = env::var("MODERATOR_NAME")
            .unwrap_or_else(|_| "moderator".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let article_search_url = env::var("ARTICLE_SEARCH_URL")
            .unwrap_or_else(|_| DEFAULT_ARTICLE_SEARCH_URL.to_string());
        let article_search_url = Url::parse(&article_search_url)
            .expect("ARTICLE_SEARCH_URL must be a valid URL");

        let article_api_key = env::var("ARTICLE_API_KEY").ok();

        let io_timeout = Duration::from_secs(parse_or("IO_TIMEOUT_SECS", 10));
        let max_write_retries = parse_or("MAX_WRITE_RETRIES", 3);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            store_backend,
            database_url,
            jwt_secret,
            moderator_name,
            bind_addr,
            cors_origins,
            article_search_url,
            article_api_key,
            io_timeout,
            max_write_retries,
            rust_log,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a number, got '{}'", key, raw)),
        Err(_) => default,
    }
}
