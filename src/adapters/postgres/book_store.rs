use crate::domain::{Book, BookId, Rarity};
use crate::ports::book_store::{BookStore as BookStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::{from_db_int, invalid_data, to_db_int};

/// PostgreSQLの行データをBookに変換する
///
/// rarity の文字列と INTEGER 列の範囲を検証する。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let rarity_str: &str = row.get("rarity");
    let rarity = Rarity::from_str(rarity_str).map_err(invalid_data)?;

    Ok(Book {
        id: BookId::from_uuid(row.get("id")),
        title: row.get("title"),
        author: row.get("author"),
        publisher: row.get("publisher"),
        copies_number: from_db_int("copies_number", row.get("copies_number"))?,
        rarity,
        genre: row.get("genre"),
        publishing_year: from_db_int("publishing_year", row.get("publishing_year"))?,
        language: row.get("language"),
        age_limit: from_db_int("age_limit", row.get("age_limit"))?,
    })
}

/// 書籍を取得する
///
/// `for_update`が真の場合は行ロックを取る（トランザクション内でのみ意味を持つ）。
pub(super) async fn select_book<'c, E>(
    executor: E,
    book_id: BookId,
    for_update: bool,
) -> Result<Option<Book>>
where
    E: PgExecutor<'c>,
{
    let sql = if for_update {
        r#"
        SELECT id, title, author, publisher, copies_number, rarity,
               genre, publishing_year, language, age_limit
        FROM books
        WHERE id = $1
        FOR UPDATE
        "#
    } else {
        r#"
        SELECT id, title, author, publisher, copies_number, rarity,
               genre, publishing_year, language, age_limit
        FROM books
        WHERE id = $1
        "#
    };

    let row = sqlx::query(sql)
        .bind(book_id.value())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(map_row_to_book).transpose()
}

/// 書籍を更新する
pub(super) async fn update_book<'c, E>(executor: E, book: &Book) -> Result<()>
where
    E: PgExecutor<'c>,
{
    let result = sqlx::query(
        r#"
        UPDATE books
        SET title = $2,
            author = $3,
            publisher = $4,
            copies_number = $5,
            rarity = $6,
            genre = $7,
            publishing_year = $8,
            language = $9,
            age_limit = $10
        WHERE id = $1
        "#,
    )
    .bind(book.id.value())
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.publisher)
    .bind(to_db_int("copies_number", book.copies_number)?)
    .bind(book.rarity.as_str())
    .bind(&book.genre)
    .bind(to_db_int("publishing_year", book.publishing_year)?)
    .bind(&book.language)
    .bind(to_db_int("age_limit", book.age_limit)?)
    .execute(executor)
    .await?;

    if result.rows_affected() < 1 {
        return Err(invalid_data(format!("book {} does not exist", book.id.value())));
    }
    Ok(())
}

/// BookStoreのPostgreSQL実装
pub struct BookStore {
    pool: PgPool,
}

impl BookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStoreTrait for BookStore {
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        select_book(&self.pool, book_id, false).await
    }

    async fn create(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, publisher, copies_number, rarity,
                genre, publishing_year, language, age_limit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(book.id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(to_db_int("copies_number", book.copies_number)?)
        .bind(book.rarity.as_str())
        .bind(&book.genre)
        .bind(to_db_int("publishing_year", book.publishing_year)?)
        .bind(&book.language)
        .bind(to_db_int("age_limit", book.age_limit)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, book: &Book) -> Result<()> {
        update_book(&self.pool, book).await
    }
}
