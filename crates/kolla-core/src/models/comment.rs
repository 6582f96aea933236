use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub team_id: i64,
    pub clip_id: i64,
    pub segment_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub body: String,
    pub segment_id: Option<i64>,
    pub parent_id: Option<i64>,
}

/// Arrange a flat, creation-ordered comment list into threads.
///
/// Replies whose parent is missing from the input are promoted to roots.
pub fn build_threads(comments: Vec<Comment>) -> Vec<CommentNode> {
    let known: std::collections::HashSet<i64> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<i64, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.parent_id.filter(|parent| known.contains(parent)) {
            Some(parent) => children.entry(parent).or_default().push(comment),
            None => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_replies(root, &mut children))
        .collect()
}

fn attach_replies(comment: Comment, children: &mut HashMap<i64, Vec<Comment>>) -> CommentNode {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach_replies(child, children))
        .collect();
    CommentNode { comment, replies }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id,
            team_id: 1,
            clip_id: 1,
            segment_id: None,
            parent_id,
            author_id: Uuid::nil(),
            body: format!("comment {}", id),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn nests_replies_under_parents_in_order() {
        let threads = build_threads(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, None),
            comment(4, Some(2)),
            comment(5, Some(1)),
        ]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, 1);
        let reply_ids: Vec<i64> = threads[0].replies.iter().map(|r| r.comment.id).collect();
        assert_eq!(reply_ids, vec![2, 5]);
        assert_eq!(threads[0].replies[0].replies[0].comment.id, 4);
        assert!(threads[1].replies.is_empty());
    }

    #[test]
    fn orphaned_reply_becomes_root() {
        let threads = build_threads(vec![comment(7, Some(99))]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].comment.id, 7);
    }
}
