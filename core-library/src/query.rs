//! High-level query API for posts.
//!
//! Composes the post repository with the content mirror: rows supply the
//! metadata, the mirror supplies each body on demand.

use crate::content::ContentMirror;
use crate::error::{LibraryError, Result};
use crate::models::{Category, Document, Post};
use crate::repositories::{PageRequest, PostRepository};
use core_runtime::config::MAX_PAGE_SIZE;
use futures::future;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Tags that mark the home page post.
const HOME_TAGS: [&str; 2] = ["home", "#home"];

/// One page of posts plus the counters the front end pages with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPage {
    pub items: Vec<Post>,
    pub has_more: bool,
    pub total_count: u64,
    pub page: u32,
    pub limit: u32,
}

/// Read access to published posts.
#[derive(Clone)]
pub struct PostQueryService {
    posts: Arc<dyn PostRepository>,
    mirror: ContentMirror,
}

impl PostQueryService {
    pub fn new(posts: Arc<dyn PostRepository>, mirror: ContentMirror) -> Self {
        Self { posts, mirror }
    }

    /// Every visible post, optionally limited to one category.
    pub async fn get_posts(&self, category: Option<Category>) -> Result<Vec<Post>> {
        let documents = self.posts.list_by_category(category).await?;
        Ok(self.with_bodies(documents).await)
    }

    /// Look a post up by file path. `blog/hello` and `blog/hello.md` both
    /// resolve. Hidden posts are returned; they are only left out of lists.
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let mut document = self.posts.find_by_path(slug).await?;
        if document.is_none() && !slug.ends_with(".md") {
            document = self.posts.find_by_path(&format!("{}.md", slug)).await?;
        }

        match document {
            Some(document) => Ok(Some(self.with_body(document).await)),
            None => Ok(None),
        }
    }

    /// One page of visible posts.
    ///
    /// `page` is 1-based. `limit` must be between 1 and `MAX_PAGE_SIZE`.
    #[instrument(skip(self))]
    pub async fn get_sorted_posts(
        &self,
        category: Option<Category>,
        page: u32,
        limit: u32,
    ) -> Result<PostsPage> {
        if limit > MAX_PAGE_SIZE {
            return Err(LibraryError::invalid(
                "limit",
                format!("must be at most {}", MAX_PAGE_SIZE),
            ));
        }
        let request = PageRequest::new(page, limit)?;

        let result = self.posts.query_by_category(category, request).await?;
        let has_more = result.has_more();
        let total_count = result.total;
        debug!(
            returned = result.items.len(),
            total_count, has_more, "Posts page loaded"
        );

        Ok(PostsPage {
            items: self.with_bodies(result.items).await,
            has_more,
            total_count,
            page,
            limit,
        })
    }

    /// The post tagged `home` (or `#home`), if one exists.
    pub async fn get_home_post(&self) -> Result<Option<Post>> {
        match self.posts.find_first_tagged(&HOME_TAGS).await? {
            Some(document) => Ok(Some(self.with_body(document).await)),
            None => Ok(None),
        }
    }

    /// Categories that currently have visible posts.
    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.posts.list_distinct_categories().await
    }

    async fn with_body(&self, document: Document) -> Post {
        let content = self.mirror.read_body(&document.file_path).await;
        Post { document, content }
    }

    async fn with_bodies(&self, documents: Vec<Document>) -> Vec<Post> {
        future::join_all(documents.into_iter().map(|d| self.with_body(d))).await
    }
}
