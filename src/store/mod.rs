// src/store/mod.rs

//! Whole-document persistence for root comments.
//!
//! A root and its full reply tree are one document. Any change inside the
//! tree is written back with [`CommentStore::replace_root`]; there is no
//! partial update path.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::comment::CommentNode;

pub use memory::MemoryCommentStore;
pub use postgres::PgCommentStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    /// The document changed between load and replace.
    #[error("document version conflict")]
    VersionConflict,

    #[error("document store timed out")]
    Timeout,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A root document as loaded, with the version it was loaded at.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRoot {
    pub node: CommentNode,
    pub version: i64,
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Roots for one article in insertion order.
    async fn list_roots_by_article(&self, title: &str) -> Result<Vec<StoredRoot>, StoreError>;

    async fn insert_root(&self, node: &CommentNode) -> Result<(), StoreError>;

    /// Overwrites the document `root_id` if it is still at `expected_version`.
    /// Returns the new version.
    async fn replace_root(
        &self,
        root_id: &str,
        node: &CommentNode,
        expected_version: i64,
    ) -> Result<i64, StoreError>;

    async fn get_root(&self, root_id: &str) -> Result<Option<StoredRoot>, StoreError>;

    /// The root whose tree holds `node_id`, found through the node index.
    async fn find_root_containing(&self, node_id: &str) -> Result<Option<StoredRoot>, StoreError>;

    /// Every root document in insertion order.
    async fn list_all_roots(&self) -> Result<Vec<StoredRoot>, StoreError>;
}
