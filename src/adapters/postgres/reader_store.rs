use crate::domain::{Reader, ReaderId};
use crate::ports::reader_store::{ReaderStore as ReaderStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{from_db_int, to_db_int};

fn map_row_to_reader(row: &PgRow) -> Result<Reader> {
    Ok(Reader {
        id: ReaderId::from_uuid(row.get("id")),
        full_name: row.get("full_name"),
        phone_number: row.get("phone_number"),
        age: from_db_int("age", row.get("age"))?,
    })
}

/// ReaderStoreのPostgreSQL実装
pub struct ReaderStore {
    pool: PgPool,
}

impl ReaderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReaderStoreTrait for ReaderStore {
    async fn get_by_id(&self, reader_id: ReaderId) -> Result<Option<Reader>> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, phone_number, age
            FROM readers
            WHERE id = $1
            "#,
        )
        .bind(reader_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_reader).transpose()
    }

    async fn create(&self, reader: &Reader) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO readers (id, full_name, phone_number, age)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reader.id.value())
        .bind(&reader.full_name)
        .bind(&reader.phone_number)
        .bind(to_db_int("age", reader.age)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
