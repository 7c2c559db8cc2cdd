//! Request and response shapes of the query endpoints.

use core_library::{Post, PostsPage, Track};
use serde::{Deserialize, Serialize};

/// Query string of the posts endpoint. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsQuery {
    /// Category id or display name; `None` lists every category
    pub category: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PostsQuery {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    pub items: Vec<Post>,
    pub has_more: bool,
    pub total_count: u64,
}

impl From<PostsPage> for PostsResponse {
    fn from(page: PostsPage) -> Self {
        Self {
            items: page.items,
            has_more: page.has_more,
            total_count: page.total_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistResponse {
    pub tracks: Vec<Track>,
}
