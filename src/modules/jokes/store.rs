//! Persistence for jokes.
//!
//! [`JokeStore`] is the seam handlers talk to; [`SqlJokeStore`] backs it with
//! the `jokes` table through parameterized sqlx queries.

use async_trait::async_trait;
use jokes_http::error::AppError;
use sqlx::SqlitePool;
use thiserror::Error;

use super::models::Joke;

const SELECT_COLUMNS: &str = "SELECT id, title, description, published FROM jokes";

/// Errors raised by a joke store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("joke storage failed: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        AppError::storage(error)
    }
}

/// Operations over the set of stored jokes
#[async_trait]
pub trait JokeStore: Send + Sync {
    /// Every joke, in id order.
    async fn find_all(&self) -> StoreResult<Vec<Joke>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Joke>>;

    async fn find_by_published(&self, published: bool) -> StoreResult<Vec<Joke>>;

    /// Jokes whose title contains `needle`, compared case-sensitively.
    /// An empty needle matches every joke.
    async fn find_by_title_containing(&self, needle: &str) -> StoreResult<Vec<Joke>>;

    /// Insert when `joke.id` is `None`, otherwise overwrite the row with that id.
    async fn save(&self, joke: Joke) -> StoreResult<Joke>;

    /// Remove one joke; removing an unknown id is a no-op.
    async fn delete_by_id(&self, id: i64) -> StoreResult<()>;

    async fn delete_all(&self) -> StoreResult<()>;
}

/// SQLite-backed joke store
#[derive(Clone)]
pub struct SqlJokeStore {
    pool: SqlitePool,
}

impl SqlJokeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JokeStore for SqlJokeStore {
    async fn find_all(&self) -> StoreResult<Vec<Joke>> {
        let jokes = sqlx::query_as::<_, Joke>(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(jokes)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Joke>> {
        let joke = sqlx::query_as::<_, Joke>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(joke)
    }

    async fn find_by_published(&self, published: bool) -> StoreResult<Vec<Joke>> {
        let jokes =
            sqlx::query_as::<_, Joke>(&format!("{SELECT_COLUMNS} WHERE published = ? ORDER BY id"))
                .bind(published)
                .fetch_all(&self.pool)
                .await?;
        Ok(jokes)
    }

    async fn find_by_title_containing(&self, needle: &str) -> StoreResult<Vec<Joke>> {
        // instr() is case-sensitive and treats % and _ literally, unlike LIKE
        let jokes = sqlx::query_as::<_, Joke>(&format!(
            "{SELECT_COLUMNS} WHERE instr(title, ?) > 0 ORDER BY id"
        ))
        .bind(needle)
        .fetch_all(&self.pool)
        .await?;
        Ok(jokes)
    }

    async fn save(&self, joke: Joke) -> StoreResult<Joke> {
        let saved = match joke.id {
            None => {
                sqlx::query_as::<_, Joke>(
                    r#"
                    INSERT INTO jokes (title, description, published)
                    VALUES (?, ?, ?)
                    RETURNING id, title, description, published
                    "#,
                )
                .bind(&joke.title)
                .bind(&joke.description)
                .bind(joke.published)
                .fetch_one(&self.pool)
                .await?
            }
            Some(id) => {
                sqlx::query_as::<_, Joke>(
                    r#"
                    INSERT INTO jokes (id, title, description, published)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT (id) DO UPDATE SET
                        title = excluded.title,
                        description = excluded.description,
                        published = excluded.published
                    RETURNING id, title, description, published
                    "#,
                )
                .bind(id)
                .bind(&joke.title)
                .bind(&joke.description)
                .bind(joke.published)
                .fetch_one(&self.pool)
                .await?
            }
        };

        tracing::debug!(id = ?saved.id, published = saved.published, "joke saved");
        Ok(saved)
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM jokes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(id, removed = result.rows_affected(), "joke delete");
        Ok(())
    }

    async fn delete_all(&self) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM jokes")
            .execute(&self.pool)
            .await?;

        tracing::debug!(removed = result.rows_affected(), "all jokes deleted");
        Ok(())
    }
}
