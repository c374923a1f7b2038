// src/tree.rs

//! Lookup and mutation over a forest of comment trees.
//!
//! All functions work in memory only. Whoever owns the forest persists the
//! containing root document afterwards.

use crate::models::comment::{CommentNode, REMOVED_TEXT};

/// Depth-first, pre-order search for `id`.
pub fn find<'a>(forest: &'a [CommentNode], id: &str) -> Option<&'a CommentNode> {
    for node in forest {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.replies, id) {
            return Some(found);
        }
    }
    None
}

/// Same traversal as [`find`], handing out a mutable handle to the match.
pub fn find_mut<'a>(forest: &'a mut [CommentNode], id: &str) -> Option<&'a mut CommentNode> {
    for node in forest.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.replies, id) {
            return Some(found);
        }
    }
    None
}

pub fn contains(forest: &[CommentNode], id: &str) -> bool {
    find(forest, id).is_some()
}

/// Appends `reply` to the replies of `parent_id`.
///
/// Returns the stored reply, or `None` (forest untouched) when the parent
/// is not in the forest.
pub fn insert_reply<'a>(
    forest: &'a mut [CommentNode],
    parent_id: &str,
    reply: CommentNode,
) -> Option<&'a CommentNode> {
    let parent = find_mut(forest, parent_id)?;
    parent.replies.push(reply);
    parent.replies.last()
}

/// Wipes the text of `id` and drops its whole subtree.
///
/// The node keeps its place among its siblings. Returns false when `id`
/// is not in the forest.
pub fn redact(forest: &mut [CommentNode], id: &str) -> bool {
    match find_mut(forest, id) {
        Some(node) => {
            node.text = REMOVED_TEXT.to_string();
            node.replies = Vec::new();
            true
        }
        None => false,
    }
}
