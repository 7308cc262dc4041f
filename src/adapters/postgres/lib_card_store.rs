use crate::domain::{LibCard, LibCardId, ReaderId};
use crate::ports::lib_card_store::{LibCardStore as LibCardStoreTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::{from_db_int, to_db_int};

fn map_row_to_lib_card(row: &PgRow) -> Result<LibCard> {
    Ok(LibCard {
        id: LibCardId::from_uuid(row.get("id")),
        reader_id: ReaderId::from_uuid(row.get("reader_id")),
        number: row.get("lib_card_num"),
        validity_days: from_db_int("validity", row.get("validity"))?,
        issue_date: row.get("issue_date"),
        action_status: row.get("action_status"),
    })
}

/// LibCardStoreのPostgreSQL実装
pub struct LibCardStore {
    pool: PgPool,
}

impl LibCardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibCardStoreTrait for LibCardStore {
    async fn get_by_reader_id(&self, reader_id: ReaderId) -> Result<Option<LibCard>> {
        let row = sqlx::query(
            r#"
            SELECT id, reader_id, lib_card_num, validity, issue_date, action_status
            FROM lib_cards
            WHERE reader_id = $1
            "#,
        )
        .bind(reader_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_lib_card).transpose()
    }

    async fn create(&self, lib_card: &LibCard) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO lib_cards (id, reader_id, lib_card_num, validity, issue_date, action_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(lib_card.id.value())
        .bind(lib_card.reader_id.value())
        .bind(&lib_card.number)
        .bind(to_db_int("validity", lib_card.validity_days)?)
        .bind(lib_card.issue_date)
        .bind(lib_card.action_status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, lib_card: &LibCard) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE lib_cards
            SET validity = $2, issue_date = $3, action_status = $4
            WHERE id = $1
            "#,
        )
        .bind(lib_card.id.value())
        .bind(to_db_int("validity", lib_card.validity_days)?)
        .bind(lib_card.issue_date)
        .bind(lib_card.action_status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
