//! In-memory store backing both cars and dealers
//!
//! One lock over both tables keeps the dealer check and the car write atomic,
//! the way a foreign key would.

use crate::domain::car::{Car, CarStore, NewCar};
use crate::domain::dealer::{Dealer, DealerStore, NewDealer};
use crate::domain::shared::{DomainError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    dealers: BTreeMap<i32, Dealer>,
    cars: BTreeMap<i32, Car>,
    next_dealer_id: i32,
    next_car_id: i32,
}

impl Tables {
    fn allocate_dealer_id(&mut self) -> i32 {
        self.next_dealer_id += 1;
        self.next_dealer_id
    }

    fn allocate_car_id(&mut self) -> i32 {
        self.next_car_id += 1;
        self.next_car_id
    }
}

/// Cars and dealers kept in process memory; clones share the same tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DealerStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Dealer>> {
        Ok(self.tables.read().await.dealers.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Dealer>> {
        Ok(self.tables.read().await.dealers.get(&id).cloned())
    }

    async fn create(&self, data: NewDealer) -> Result<Dealer> {
        let mut tables = self.tables.write().await;
        let dealer = data.into_dealer(tables.allocate_dealer_id());
        tables.dealers.insert(dealer.id, dealer.clone());
        Ok(dealer)
    }

    async fn update(&self, id: i32, data: NewDealer) -> Result<Option<Dealer>> {
        let mut tables = self.tables.write().await;
        Ok(tables.dealers.get_mut(&id).map(|slot| {
            *slot = data.into_dealer(id);
            slot.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.dealers.remove(&id).is_none() {
            return Ok(false);
        }
        tables.cars.retain(|_, car| car.dealer_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CarStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Car>> {
        Ok(self.tables.read().await.cars.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Car>> {
        Ok(self.tables.read().await.cars.get(&id).cloned())
    }

    async fn create(&self, data: NewCar) -> Result<Car> {
        let mut tables = self.tables.write().await;
        if !tables.dealers.contains_key(&data.dealer_id) {
            return Err(DomainError::dealer_not_found(data.dealer_id));
        }
        let car = data.into_car(tables.allocate_car_id());
        tables.cars.insert(car.id, car.clone());
        Ok(car)
    }

    async fn update(&self, id: i32, data: NewCar) -> Result<Option<Car>> {
        let mut tables = self.tables.write().await;
        if !tables.cars.contains_key(&id) {
            return Ok(None);
        }
        if !tables.dealers.contains_key(&data.dealer_id) {
            return Err(DomainError::dealer_not_found(data.dealer_id));
        }
        let car = data.into_car(id);
        tables.cars.insert(id, car.clone());
        Ok(Some(car))
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        Ok(self.tables.write().await.cars.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dealer() -> NewDealer {
        NewDealer {
            name: "AutoMir".to_string(),
            city: "Moscow".to_string(),
            address: "Lenina 1".to_string(),
            area: "Center".to_string(),
            rating: Decimal::new(45, 1),
        }
    }

    fn car(dealer_id: i32) -> NewCar {
        NewCar {
            firm: "Toyota".to_string(),
            model: "Camry".to_string(),
            year: 2022,
            power: 180,
            color: "black".to_string(),
            price: Some(Decimal::new(28000, 0)),
            dealer_id,
        }
    }

    #[tokio::test]
    async fn test_create_car_assigns_ids() {
        let store = InMemoryStore::new();
        let dealer = DealerStore::create(&store, dealer()).await.unwrap();

        let first = CarStore::create(&store, car(dealer.id)).await.unwrap();
        let second = CarStore::create(&store, car(dealer.id)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(CarStore::list(&store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_car_with_missing_dealer() {
        let store = InMemoryStore::new();

        let err = CarStore::create(&store, car(999)).await.unwrap_err();

        assert_eq!(err, DomainError::dealer_not_found(999));
        assert!(CarStore::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_car_checked_before_dealer() {
        let store = InMemoryStore::new();
        assert_eq!(CarStore::update(&store, 5, car(999)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_car_with_missing_dealer() {
        let store = InMemoryStore::new();
        let dealer = DealerStore::create(&store, dealer()).await.unwrap();
        let created = CarStore::create(&store, car(dealer.id)).await.unwrap();

        let err = CarStore::update(&store, created.id, car(999)).await.unwrap_err();

        assert!(matches!(err, DomainError::DependencyNotFound(_)));
        assert_eq!(
            CarStore::get(&store, created.id).await.unwrap(),
            Some(created)
        );
    }

    #[tokio::test]
    async fn test_delete_dealer_cascades_to_cars() {
        let store = InMemoryStore::new();
        let dealer = DealerStore::create(&store, dealer()).await.unwrap();
        CarStore::create(&store, car(dealer.id)).await.unwrap();

        assert!(DealerStore::delete(&store, dealer.id).await.unwrap());
        assert!(CarStore::list(&store).await.unwrap().is_empty());
        assert!(!DealerStore::delete(&store, dealer.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_car() {
        let store = InMemoryStore::new();
        let dealer = DealerStore::create(&store, dealer()).await.unwrap();
        let created = CarStore::create(&store, car(dealer.id)).await.unwrap();

        assert!(CarStore::delete(&store, created.id).await.unwrap());
        assert!(!CarStore::delete(&store, created.id).await.unwrap());
    }
}
