use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::author::Author;

/// Text written over a comment when a moderator removes it.
pub const REMOVED_TEXT: &str = "COMMENT REMOVED BY MODERATOR!";

/// A comment and its entire reply subtree.
///
/// Roots carry `article_title` and are persisted as one document each;
/// replies only exist inside the `replies` of their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_title: Option<String>,
    pub text: String,
    pub author_email: String,
    pub author_display_name: String,
    pub created_at: DateTime<Utc>,
    /// Append order is reply order. Never re-sorted.
    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Top-level comment on an article.
    pub fn new_root(article_title: &str, text: &str, author: Author) -> Self {
        let mut node = Self::new_reply(text, author);
        node.article_title = Some(article_title.to_string());
        node
    }

    pub fn new_reply(text: &str, author: Author) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            article_title: None,
            text: text.to_string(),
            author_email: author.email,
            author_display_name: author.display_name,
            created_at: Utc::now(),
            replies: Vec::new(),
        }
    }

    pub fn is_redacted(&self) -> bool {
        self.text == REMOVED_TEXT && self.replies.is_empty()
    }

    /// Every id in this subtree, pre-order.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        collect_ids(self, &mut ids);
        ids
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::count).sum::<usize>()
    }
}

fn collect_ids(node: &CommentNode, ids: &mut Vec<String>) {
    ids.push(node.id.clone());
    for reply in &node.replies {
        collect_ids(reply, ids);
    }
}

/// DTO for posting a top-level comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 500,
        message = "articleTitle must be between 1 and 500 characters"
    ))]
    pub article_title: String,

    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 10000,
        message = "text must be between 1 and 10000 characters"
    ))]
    pub text: String,
}

/// DTO for replying to any existing comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 10000,
        message = "text must be between 1 and 10000 characters"
    ))]
    pub text: String,
}
