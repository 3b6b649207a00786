use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ReviewStore {
    pool: SqlitePool,
}

/// A review left by a user on a book. Ratings are in (0, 5].
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Review {
    #[serde(skip_serializing)]
    pub id: i64,
    pub uid: String,
    pub rating: f64,
    pub review_text: String,
    pub user_uid: Option<String>,
    pub book_uid: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ReviewStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Attach a review to a book. Returns the stored row.
    pub async fn create(
        &self,
        book_uid: &str,
        user_uid: &str,
        rating: f64,
        review_text: &str,
    ) -> Result<Review, sqlx::Error> {
        let uid = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO reviews (uid, rating, review_text, user_uid, book_uid) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&uid)
        .bind(rating)
        .bind(review_text)
        .bind(user_uid)
        .bind(book_uid)
        .execute(&self.pool)
        .await?;

        let row = self.get_by_uid(&uid).await?;
        row.ok_or(sqlx::Error::RowNotFound)
    }

    /// List all reviews, newest first.
    pub async fn list_all(&self) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uid, rating, review_text, user_uid, book_uid, created_at, updated_at \
             FROM reviews ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// List the reviews written by a user, newest first.
    pub async fn list_by_user(&self, user_uid: &str) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uid, rating, review_text, user_uid, book_uid, created_at, updated_at \
             FROM reviews WHERE user_uid = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_uid)
        .fetch_all(&self.pool)
        .await
    }

    /// List the reviews on a book, newest first.
    pub async fn list_by_book(&self, book_uid: &str) -> Result<Vec<Review>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uid, rating, review_text, user_uid, book_uid, created_at, updated_at \
             FROM reviews WHERE book_uid = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(book_uid)
        .fetch_all(&self.pool)
        .await
    }

    /// Get a review by its public uid.
    pub async fn get_by_uid(&self, uid: &str) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uid, rating, review_text, user_uid, book_uid, created_at, updated_at \
             FROM reviews WHERE uid = ?",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a review by uid.
    pub async fn delete(&self, uid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
