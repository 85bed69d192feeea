//! PostgreSQL implementation of CarStore

use crate::domain::car::{Car, CarStore, NewCar};
use crate::domain::shared::{DomainError, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error};

const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct PgCarStore {
    pool: PgPool,
}

impl PgCarStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a write error, turning a dealer FK violation into `DependencyNotFound`
fn map_write_error(e: sqlx::Error, dealer_id: i32) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) {
            return DomainError::dealer_not_found(dealer_id);
        }
    }
    error!("Failed to write car: {}", e);
    DomainError::from(e)
}

#[async_trait]
impl CarStore for PgCarStore {
    async fn list(&self) -> Result<Vec<Car>> {
        let cars = sqlx::query_as::<_, Car>(
            "SELECT id, firm, model, year, power, color, price, dealer_id FROM cars ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(cars)
    }

    async fn get(&self, id: i32) -> Result<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(
            "SELECT id, firm, model, year, power, color, price, dealer_id FROM cars WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(car)
    }

    async fn create(&self, data: NewCar) -> Result<Car> {
        let dealer_id = data.dealer_id;
        let car = sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (firm, model, year, power, color, price, dealer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, firm, model, year, power, color, price, dealer_id
            "#,
        )
        .bind(&data.firm)
        .bind(&data.model)
        .bind(data.year)
        .bind(data.power)
        .bind(&data.color)
        .bind(data.price)
        .bind(data.dealer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, dealer_id))?;

        debug!("Created car: {}", car.id);
        Ok(car)
    }

    async fn update(&self, id: i32, data: NewCar) -> Result<Option<Car>> {
        let dealer_id = data.dealer_id;
        let car = sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars
            SET firm = $2, model = $3, year = $4, power = $5, color = $6, price = $7, dealer_id = $8
            WHERE id = $1
            RETURNING id, firm, model, year, power, color, price, dealer_id
            "#,
        )
        .bind(id)
        .bind(&data.firm)
        .bind(&data.model)
        .bind(data.year)
        .bind(data.power)
        .bind(&data.color)
        .bind(data.price)
        .bind(data.dealer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, dealer_id))?;

        if car.is_some() {
            debug!("Updated car: {}", id);
        }
        Ok(car)
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!("Deleted car {}: {} row(s)", id, result.rows_affected());
        Ok(result.rows_affected() > 0)
    }
}
