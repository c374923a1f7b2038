// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction, types::Json};

use super::{CommentStore, StoreError, StoredRoot};
use crate::models::comment::CommentNode;

/// Row shape shared by every document read.
#[derive(Debug, FromRow)]
struct DocumentRow {
    document: Json<CommentNode>,
    version: i64,
}

impl From<DocumentRow> for StoredRoot {
    fn from(row: DocumentRow) -> Self {
        StoredRoot {
            node: row.document.0,
            version: row.version,
        }
    }
}

/// Root documents in `comment_documents` (JSONB), with `comment_node_index`
/// mapping every node id to its root.
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rebuilds the index rows of one root inside the caller's transaction.
    async fn reindex(
        tx: &mut Transaction<'_, Postgres>,
        root_id: &str,
        node: &CommentNode,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM comment_node_index WHERE root_id = $1")
            .bind(root_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO comment_node_index (node_id, root_id)
            SELECT UNNEST($1::TEXT[]), $2
            "#,
        )
        .bind(node.node_ids())
        .bind(root_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn list_roots_by_article(&self, title: &str) -> Result<Vec<StoredRoot>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT document, version
            FROM comment_documents
            WHERE article_title = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(title)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredRoot::from).collect())
    }

    async fn insert_root(&self, node: &CommentNode) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO comment_documents (id, article_title, document, version, created_at)
            VALUES ($1, $2, $3, 1, $4)
            "#,
        )
        .bind(&node.id)
        .bind(node.article_title.as_deref().unwrap_or_default())
        .bind(Json(node))
        .bind(node.created_at)
        .execute(&mut *tx)
        .await?;

        Self::reindex(&mut tx, &node.id, node).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace_root(
        &self,
        root_id: &str,
        node: &CommentNode,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE comment_documents
            SET document = $1, version = version + 1
            WHERE id = $2 AND version = $3
            RETURNING version
            "#,
        )
        .bind(Json(node))
        .bind(root_id)
        .bind(expected_version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((version,)) = updated else {
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT version FROM comment_documents WHERE id = $1")
                    .bind(root_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => StoreError::VersionConflict,
                None => StoreError::NotFound,
            });
        };

        Self::reindex(&mut tx, root_id, node).await?;

        tx.commit().await?;
        Ok(version)
    }

    async fn get_root(&self, root_id: &str) -> Result<Option<StoredRoot>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT document, version FROM comment_documents WHERE id = $1",
        )
        .bind(root_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredRoot::from))
    }

    async fn find_root_containing(&self, node_id: &str) -> Result<Option<StoredRoot>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT d.document, d.version
            FROM comment_node_index i
            JOIN comment_documents d ON d.id = i.root_id
            WHERE i.node_id = $1
            "#,
        )
        .bind(node_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredRoot::from))
    }

    async fn list_all_roots(&self) -> Result<Vec<StoredRoot>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT document, version FROM comment_documents ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StoredRoot::from).collect())
    }
}
