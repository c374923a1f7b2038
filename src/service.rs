// src/service.rs

use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    config::Config,
    error::AppError,
    models::{
        author::{Author, Identity},
        comment::CommentNode,
    },
    store::{CommentStore, StoreError, StoredRoot},
    tree,
};

/// Public comment operations on top of a [`CommentStore`].
///
/// Every mutation is load root → change tree in memory → replace root,
/// retried when the root moved underneath us.
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    moderator_name: String,
    io_timeout: Duration,
    max_write_retries: u32,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn CommentStore>,
        moderator_name: impl Into<String>,
        io_timeout: Duration,
        max_write_retries: u32,
    ) -> Self {
        Self {
            store,
            moderator_name: moderator_name.into(),
            io_timeout,
            max_write_retries,
        }
    }

    pub fn from_config(store: Arc<dyn CommentStore>, config: &Config) -> Self {
        Self::new(
            store,
            config.moderator_name.clone(),
            config.io_timeout,
            config.max_write_retries,
        )
    }

    pub fn moderator_name(&self) -> &str {
        &self.moderator_name
    }

    /// Root comments of an article, in the order they were posted.
    pub async fn list_comments(&self, article_title: &str) -> Result<Vec<CommentNode>, AppError> {
        let roots = self
            .timed(self.store.list_roots_by_article(article_title))
            .await?;
        Ok(roots.into_iter().map(|r| r.node).collect())
    }

    pub async fn post_comment(
        &self,
        article_title: &str,
        text: &str,
        identity: Option<&Identity>,
    ) -> Result<CommentNode, AppError> {
        let author = Author::from_identity(identity);
        let root = CommentNode::new_root(article_title, text, author);

        self.timed(self.store.insert_root(&root)).await?;
        tracing::info!(comment_id = %root.id, article = %article_title, "Posted comment");

        Ok(root)
    }

    /// Replies to any comment, root or nested.
    pub async fn post_reply(
        &self,
        target_id: &str,
        text: &str,
        identity: Option<&Identity>,
    ) -> Result<CommentNode, AppError> {
        let author = Author::from_identity(identity);
        let reply = CommentNode::new_reply(text, author);

        let created = self
            .mutate_root(target_id, false, |forest| {
                tree::insert_reply(forest, target_id, reply.clone()).cloned()
            })
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        tracing::info!(comment_id = %created.id, parent_id = %target_id, "Posted reply");
        Ok(created)
    }

    /// Moderator removal of a comment and everything below it.
    pub async fn redact_comment(
        &self,
        target_id: &str,
        actor: Option<&Identity>,
    ) -> Result<(), AppError> {
        let is_moderator = actor.is_some_and(|identity| identity.is_moderator(&self.moderator_name));
        if !is_moderator {
            return Err(AppError::Unauthorized(
                "Only a moderator can remove comments".to_string(),
            ));
        }

        let pruned = self
            .mutate_root(target_id, true, |forest| {
                let pruned = tree::find(forest, target_id)?.count() - 1;
                tree::redact(forest, target_id).then_some(pruned)
            })
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        tracing::info!(
            comment_id = %target_id,
            pruned_replies = pruned,
            "Comment removed by moderator"
        );
        Ok(())
    }

    /// Applies `mutate` to the root document holding `target_id` and writes
    /// the whole root back.
    ///
    /// `Ok(None)` means no root holds `target_id`; nothing was written.
    async fn mutate_root<R, F>(
        &self,
        target_id: &str,
        scan_fallback: bool,
        mutate: F,
    ) -> Result<Option<R>, AppError>
    where
        F: Fn(&mut [CommentNode]) -> Option<R>,
    {
        let attempts = self.max_write_retries + 1;

        for attempt in 1..=attempts {
            let Some(stored) = self.locate_root(target_id, scan_fallback).await? else {
                return Ok(None);
            };

            let mut forest = [stored.node];
            let Some(result) = mutate(&mut forest[..]) else {
                return Ok(None);
            };
            let [root] = forest;

            match self
                .timed(self.store.replace_root(&root.id, &root, stored.version))
                .await
            {
                Ok(_) => return Ok(Some(result)),
                Err(StoreError::VersionConflict) if attempt < attempts => {
                    tracing::warn!(
                        root_id = %root.id,
                        "Root document changed during write, retrying (Attempt {})",
                        attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict(
            "Comment thread changed, please retry".to_string(),
        ))
    }

    /// Direct root hit first, then the node index, then (optionally) a scan
    /// of every root.
    ///
    /// A root only counts as found when its tree really holds `target_id`,
    /// so a stale index entry falls through to the next step.
    async fn locate_root(
        &self,
        target_id: &str,
        scan_fallback: bool,
    ) -> Result<Option<StoredRoot>, AppError> {
        let holds = |root: &StoredRoot| tree::contains(std::slice::from_ref(&root.node), target_id);

        if let Some(root) = self.timed(self.store.get_root(target_id)).await? {
            return Ok(Some(root));
        }

        match self.timed(self.store.find_root_containing(target_id)).await? {
            Some(root) if holds(&root) => return Ok(Some(root)),
            Some(root) => {
                tracing::warn!(
                    target_id = %target_id,
                    root_id = %root.node.id,
                    "Node index points at a root that no longer holds the comment"
                );
            }
            None => {}
        }

        if !scan_fallback {
            return Ok(None);
        }

        tracing::debug!(target_id = %target_id, "Node index miss, scanning all roots");
        let roots = self.timed(self.store.list_all_roots()).await?;
        Ok(roots.into_iter().find(|r| holds(r)))
    }

    async fn timed<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.io_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}
