use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct BookStore {
    pool: SqlitePool,
}

/// A catalogued book. `user_uid` is the submitting user.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Book {
    #[serde(skip_serializing)]
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub published_date: String,
    pub page_count: i64,
    pub language: String,
    pub user_uid: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating a book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub published_date: String,
    pub page_count: i64,
    pub language: String,
}

impl BookStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a book owned by `user_uid`. Returns the stored row.
    pub async fn create(&self, book: &NewBook, user_uid: &str) -> Result<Book, sqlx::Error> {
        let uid = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO books (uid, title, author, publisher, published_date, page_count, language, user_uid) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&uid)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.published_date)
        .bind(book.page_count)
        .bind(&book.language)
        .bind(user_uid)
        .execute(&self.pool)
        .await?;

        let row = self.get_by_uid(&uid).await?;
        row.ok_or(sqlx::Error::RowNotFound)
    }

    /// List all books, newest first.
    pub async fn list_all(&self) -> Result<Vec<Book>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uid, title, author, publisher, published_date, page_count, language, \
             user_uid, created_at, updated_at FROM books ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// List the books submitted by a user, newest first.
    pub async fn list_by_user(&self, user_uid: &str) -> Result<Vec<Book>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uid, title, author, publisher, published_date, page_count, language, \
             user_uid, created_at, updated_at FROM books WHERE user_uid = ? \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_uid)
        .fetch_all(&self.pool)
        .await
    }

    /// Get a book by its public uid.
    pub async fn get_by_uid(&self, uid: &str) -> Result<Option<Book>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, uid, title, author, publisher, published_date, page_count, language, \
             user_uid, created_at, updated_at FROM books WHERE uid = ?",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
    }

    /// Overwrite the mutable fields of a book.
    pub async fn update(&self, uid: &str, book: &NewBook) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE books SET title = ?, author = ?, publisher = ?, published_date = ?, \
             page_count = ?, language = ?, updated_at = datetime('now') WHERE uid = ?",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.published_date)
        .bind(book.page_count)
        .bind(&book.language)
        .bind(uid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a book by uid.
    pub async fn delete(&self, uid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
