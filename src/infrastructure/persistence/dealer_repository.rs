//! PostgreSQL implementation of DealerStore

use crate::domain::dealer::{Dealer, DealerStore, NewDealer};
use crate::domain::shared::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

pub struct PgDealerStore {
    pool: PgPool,
}

impl PgDealerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DealerStore for PgDealerStore {
    async fn list(&self) -> Result<Vec<Dealer>> {
        let dealers = sqlx::query_as::<_, Dealer>(
            "SELECT id, name, city, address, area, rating FROM dealers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(dealers)
    }

    async fn get(&self, id: i32) -> Result<Option<Dealer>> {
        let dealer = sqlx::query_as::<_, Dealer>(
            "SELECT id, name, city, address, area, rating FROM dealers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(dealer)
    }

    async fn create(&self, data: NewDealer) -> Result<Dealer> {
        let dealer = sqlx::query_as::<_, Dealer>(
            r#"
            INSERT INTO dealers (name, city, address, area, rating)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, city, address, area, rating
            "#,
        )
        .bind(&data.name)
        .bind(&data.city)
        .bind(&data.address)
        .bind(&data.area)
        .bind(data.rating)
        .fetch_one(&self.pool)
        .await?;

        debug!("Created dealer: {}", dealer.id);
        Ok(dealer)
    }

    async fn update(&self, id: i32, data: NewDealer) -> Result<Option<Dealer>> {
        let dealer = sqlx::query_as::<_, Dealer>(
            r#"
            UPDATE dealers
            SET name = $2, city = $3, address = $4, area = $5, rating = $6
            WHERE id = $1
            RETURNING id, name, city, address, area, rating
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.city)
        .bind(&data.address)
        .bind(&data.area)
        .bind(data.rating)
        .fetch_optional(&self.pool)
        .await?;
        Ok(dealer)
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        // Cars go with the dealer (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM dealers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
