// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CommentStore, StoreError, StoredRoot};
use crate::models::comment::CommentNode;

#[derive(Default)]
struct Inner {
    /// Insertion order.
    roots: Vec<StoredRoot>,
    /// node id -> root id
    index: HashMap<String, String>,
}

impl Inner {
    fn position(&self, root_id: &str) -> Option<usize> {
        self.roots.iter().position(|r| r.node.id == root_id)
    }

    fn reindex(&mut self, root_id: &str, node: &CommentNode) {
        self.index.retain(|_, owner| owner != root_id);
        for id in node.node_ids() {
            self.index.insert(id, root_id.to_string());
        }
    }
}

/// Process-local store with the same semantics as the Postgres one.
#[derive(Default)]
pub struct MemoryCommentStore {
    inner: RwLock<Inner>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for MemoryCommentStore {
    async fn list_roots_by_article(&self, title: &str) -> Result<Vec<StoredRoot>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .roots
            .iter()
            .filter(|r| r.node.article_title.as_deref() == Some(title))
            .cloned()
            .collect())
    }

    async fn insert_root(&self, node: &CommentNode) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.roots.push(StoredRoot {
            node: node.clone(),
            version: 1,
        });
        inner.reindex(&node.id, node);
        Ok(())
    }

    async fn replace_root(
        &self,
        root_id: &str,
        node: &CommentNode,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        let pos = inner.position(root_id).ok_or(StoreError::NotFound)?;

        let stored = &mut inner.roots[pos];
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict);
        }
        stored.node = node.clone();
        stored.version += 1;
        let version = stored.version;

        inner.reindex(root_id, node);
        Ok(version)
    }

    async fn get_root(&self, root_id: &str) -> Result<Option<StoredRoot>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.position(root_id).map(|pos| inner.roots[pos].clone()))
    }

    async fn find_root_containing(&self, node_id: &str) -> Result<Option<StoredRoot>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .index
            .get(node_id)
            .and_then(|root_id| inner.position(root_id))
            .map(|pos| inner.roots[pos].clone()))
    }

    async fn list_all_roots(&self) -> Result<Vec<StoredRoot>, StoreError> {
        Ok(self.inner.read().await.roots.clone())
    }
}
