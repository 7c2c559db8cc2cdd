//! Post repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{format_timestamp, Category, Document, PostRow};
use crate::repositories::{Page, PageRequest};
use crate::schema;
use async_trait::async_trait;
use sqlx::{query_as, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, instrument};

/// Columns selected for every `PostRow`.
const POST_COLUMNS: &str = "id, file_path, title, subtitle, category, description, tags, \
     date_published, narration, audio_file, pinned, hidden";

/// Ordering contract shared by every list query.
const POST_ORDERING: &str = "ORDER BY pinned DESC, date_published DESC, file_path ASC";

/// Exact membership test against the JSON tag array.
const HAS_TAG: &str = "EXISTS (SELECT 1 FROM json_each(posts.tags) WHERE json_each.value = ?)";

/// One staged mutation of the incremental sync path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostChange {
    Upsert(Document),
    /// Tombstone: remove whatever row exists for this path
    Delete(String),
}

/// Counts reported by [`PostRepository::apply_changes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub upserted: usize,
    /// Tombstones that actually removed a row
    pub deleted: usize,
}

/// Post repository interface for data access operations
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a document or replace the row with the same file path
    ///
    /// # Errors
    /// Returns error if:
    /// - Document validation fails
    /// - Database error occurs
    async fn upsert(&self, document: &Document) -> Result<()>;

    /// Delete a document by file path
    ///
    /// # Returns
    /// - `Ok(true)` if a row was deleted
    /// - `Ok(false)` if no row had that path
    async fn delete_by_path(&self, file_path: &str) -> Result<bool>;

    /// Find a document by file path, hidden or not
    async fn find_by_path(&self, file_path: &str) -> Result<Option<Document>>;

    /// Visible documents in one category (or all categories), one page at a time
    ///
    /// Pinned documents come first, then newest first.
    async fn query_by_category(
        &self,
        category: Option<Category>,
        page_request: PageRequest,
    ) -> Result<Page<Document>>;

    /// Every visible document in one category (or all categories)
    async fn list_by_category(&self, category: Option<Category>) -> Result<Vec<Document>>;

    /// Categories that have at least one visible document, in declaration order
    async fn list_distinct_categories(&self) -> Result<Vec<Category>>;

    /// Documents tagged exactly `tag` that carry an audio reference
    async fn find_with_audio_by_tag(&self, tag: &str) -> Result<Vec<Document>>;

    /// Documents in `category` that carry an audio reference, optionally
    /// narrowed to those tagged exactly `tag`
    async fn find_with_audio_by_category(
        &self,
        category: Category,
        tag: Option<&str>,
    ) -> Result<Vec<Document>>;

    /// First document carrying any of `tags`, hidden or not
    async fn find_first_tagged(&self, tags: &[&str]) -> Result<Option<Document>>;

    /// Count all rows
    async fn count(&self) -> Result<i64>;

    /// File paths that occur in more than one row, with their counts
    async fn find_duplicate_paths(&self) -> Result<Vec<(String, i64)>>;

    /// Replace the whole store in one transaction
    ///
    /// Drops the table, recreates the schema and inserts `documents`. On any
    /// failure the transaction rolls back and the previous contents remain.
    ///
    /// # Returns
    /// Number of rows written
    async fn replace_all(&self, documents: &[Document]) -> Result<usize>;

    /// Apply upserts and tombstones in one transaction
    async fn apply_changes(&self, changes: &[PostChange]) -> Result<ChangeSummary>;
}

/// SQLite implementation of PostRepository
#[derive(Clone)]
pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    /// Create a new SQLite post repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn validated(document: &Document) -> Result<()> {
    document
        .validate()
        .map_err(|msg| LibraryError::invalid("document", msg))
}

fn into_documents(rows: Vec<PostRow>) -> Result<Vec<Document>> {
    rows.into_iter().map(Document::try_from).collect()
}

async fn upsert_on(conn: &mut SqliteConnection, document: &Document) -> Result<()> {
    validated(document)?;

    let tags = serde_json::to_string(&document.tags).map_err(|e| LibraryError::CorruptRow {
        file_path: document.file_path.clone(),
        message: format!("tags: {}", e),
    })?;

    sqlx::query(
        r#"
        INSERT INTO posts (
            file_path, title, subtitle, category, description, tags,
            date_published, narration, audio_file, pinned, hidden
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(file_path) DO UPDATE SET
            title = excluded.title,
            subtitle = excluded.subtitle,
            category = excluded.category,
            description = excluded.description,
            tags = excluded.tags,
            date_published = excluded.date_published,
            narration = excluded.narration,
            audio_file = excluded.audio_file,
            pinned = excluded.pinned,
            hidden = excluded.hidden
        "#,
    )
    .bind(&document.file_path)
    .bind(&document.title)
    .bind(&document.subtitle)
    .bind(document.category.id())
    .bind(&document.description)
    .bind(tags)
    .bind(format_timestamp(&document.date_published))
    .bind(&document.narration)
    .bind(&document.audio_file)
    .bind(document.pinned)
    .bind(document.hidden)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn delete_on(conn: &mut SqliteConnection, file_path: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE file_path = ?")
        .bind(file_path)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    #[instrument(skip(self, document), fields(file_path = %document.file_path))]
    async fn upsert(&self, document: &Document) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_on(&mut conn, document).await
    }

    async fn delete_by_path(&self, file_path: &str) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        delete_on(&mut conn, file_path).await
    }

    async fn find_by_path(&self, file_path: &str) -> Result<Option<Document>> {
        let sql = format!("SELECT {} FROM posts WHERE file_path = ?", POST_COLUMNS);
        let row = query_as::<Sqlite, PostRow>(&sql)
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Document::try_from).transpose()
    }

    async fn query_by_category(
        &self,
        category: Option<Category>,
        page_request: PageRequest,
    ) -> Result<Page<Document>> {
        let category_id = category.map(|c| c.id());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE hidden = 0 AND (?1 IS NULL OR category = ?1)",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {} FROM posts WHERE hidden = 0 AND (?1 IS NULL OR category = ?1) {} \
             LIMIT ?2 OFFSET ?3",
            POST_COLUMNS, POST_ORDERING
        );
        let offset = i64::try_from(page_request.offset())
            .map_err(|_| LibraryError::invalid("page", "offset out of range"))?;
        let rows = query_as::<Sqlite, PostRow>(&sql)
            .bind(category_id)
            .bind(i64::from(page_request.limit()))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let items = into_documents(rows)?;
        Ok(Page::new(items, total.max(0) as u64, page_request))
    }

    async fn list_by_category(&self, category: Option<Category>) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE hidden = 0 AND (?1 IS NULL OR category = ?1) {}",
            POST_COLUMNS, POST_ORDERING
        );
        let rows = query_as::<Sqlite, PostRow>(&sql)
            .bind(category.map(|c| c.id()))
            .fetch_all(&self.pool)
            .await?;

        into_documents(rows)
    }

    async fn list_distinct_categories(&self) -> Result<Vec<Category>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM posts WHERE hidden = 0 AND category <> ''",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories: Vec<Category> =
            ids.iter().filter_map(|id| Category::parse(id)).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn find_with_audio_by_tag(&self, tag: &str) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE audio_file IS NOT NULL AND {} {}",
            POST_COLUMNS, HAS_TAG, POST_ORDERING
        );
        let rows = query_as::<Sqlite, PostRow>(&sql)
            .bind(tag)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Tagged audio documents found");
        into_documents(rows)
    }

    #[instrument(skip(self))]
    async fn find_with_audio_by_category(
        &self,
        category: Category,
        tag: Option<&str>,
    ) -> Result<Vec<Document>> {
        let sql = match tag {
            Some(_) => format!(
                "SELECT {} FROM posts WHERE category = ? AND audio_file IS NOT NULL AND {} {}",
                POST_COLUMNS, HAS_TAG, POST_ORDERING
            ),
            None => format!(
                "SELECT {} FROM posts WHERE category = ? AND audio_file IS NOT NULL {}",
                POST_COLUMNS, POST_ORDERING
            ),
        };

        let mut statement = query_as::<Sqlite, PostRow>(&sql).bind(category.id());
        if let Some(tag) = tag {
            statement = statement.bind(tag);
        }
        let rows = statement.fetch_all(&self.pool).await?;

        debug!(count = rows.len(), "Category audio documents found");
        into_documents(rows)
    }

    async fn find_first_tagged(&self, tags: &[&str]) -> Result<Option<Document>> {
        for tag in tags {
            let sql = format!(
                "SELECT {} FROM posts WHERE {} {} LIMIT 1",
                POST_COLUMNS, HAS_TAG, POST_ORDERING
            );
            let row = query_as::<Sqlite, PostRow>(&sql)
                .bind(*tag)
                .fetch_optional(&self.pool)
                .await?;

            if let Some(row) = row {
                return Document::try_from(row).map(Some);
            }
        }

        Ok(None)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn find_duplicate_paths(&self) -> Result<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT file_path, COUNT(*) AS occurrences FROM posts \
             GROUP BY file_path HAVING COUNT(*) > 1",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    async fn replace_all(&self, documents: &[Document]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(schema::DROP_POSTS_TABLE)
            .execute(&mut *tx)
            .await?;
        schema::ensure_schema(&mut tx).await?;

        for document in documents {
            upsert_on(&mut tx, document).await?;
        }

        tx.commit().await?;
        debug!(written = documents.len(), "Posts table rebuilt");
        Ok(documents.len())
    }

    #[instrument(skip(self, changes), fields(changes = changes.len()))]
    async fn apply_changes(&self, changes: &[PostChange]) -> Result<ChangeSummary> {
        let mut tx = self.pool.begin().await?;
        let mut summary = ChangeSummary::default();

        for change in changes {
            match change {
                PostChange::Upsert(document) => {
                    upsert_on(&mut tx, document).await?;
                    summary.upserted += 1;
                }
                PostChange::Delete(file_path) => {
                    if delete_on(&mut tx, file_path).await? {
                        summary.deleted += 1;
                    }
                }
            }
        }

        tx.commit().await?;
        Ok(summary)
    }
}
