//! Car store decorator that announces successful mutations

use crate::domain::car::{Car, CarEvent, CarEventPublisher, CarEventType, CarStore, NewCar};
use crate::domain::shared::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Wraps a `CarStore` and publishes a `CarEvent` after every successful
/// mutation. The store outcome is always what the caller gets back.
pub struct NotifyingCarStore {
    inner: Arc<dyn CarStore>,
    publisher: Arc<dyn CarEventPublisher>,
}

impl NotifyingCarStore {
    pub fn new(inner: Arc<dyn CarStore>, publisher: Arc<dyn CarEventPublisher>) -> Self {
        Self { inner, publisher }
    }

    async fn notify(&self, event_type: CarEventType, car: &Car) {
        debug!(event_type = %event_type, car_id = car.id, "Publishing car event");
        self.publisher.publish(CarEvent::new(event_type, car)).await;
    }
}

#[async_trait]
impl CarStore for NotifyingCarStore {
    async fn list(&self) -> Result<Vec<Car>> {
        self.inner.list().await
    }

    async fn get(&self, id: i32) -> Result<Option<Car>> {
        self.inner.get(id).await
    }

    async fn create(&self, data: NewCar) -> Result<Car> {
        let car = self.inner.create(data).await?;
        self.notify(CarEventType::Create, &car).await;
        Ok(car)
    }

    async fn update(&self, id: i32, data: NewCar) -> Result<Option<Car>> {
        let updated = self.inner.update(id, data).await?;
        if let Some(car) = &updated {
            self.notify(CarEventType::Update, car).await;
        }
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        // Snapshot first: nothing is retrievable once the row is gone.
        let existing = self.inner.get(id).await?;
        let deleted = self.inner.delete(id).await?;
        if let (true, Some(car)) = (deleted, &existing) {
            self.notify(CarEventType::Delete, car).await;
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::car::event::MockCarEventPublisher;
    use crate::domain::car::repository::MockCarStore;
    use crate::domain::shared::DomainError;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use rust_decimal::Decimal;

    fn new_camry(dealer_id: i32) -> NewCar {
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

    fn decorate(store: MockCarStore, publisher: MockCarEventPublisher) -> NotifyingCarStore {
        NotifyingCarStore::new(Arc::new(store), Arc::new(publisher))
    }

    #[tokio::test]
    async fn test_create_publishes_one_create_event() {
        let mut store = MockCarStore::new();
        store
            .expect_create()
            .times(1)
            .returning(|data| Ok(data.into_car(42)));

        let mut publisher = MockCarEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|event| {
                event.event_type() == CarEventType::Create
                    && event.car_id() == 42
                    && event.car().firm == "Toyota"
                    && event.car().price == Some(Decimal::new(28000, 0))
            })
            .times(1)
            .returning(|_| ());

        let car = decorate(store, publisher).create(new_camry(1)).await.unwrap();
        assert_eq!(car.id, 42);
        assert_eq!(car.model, "Camry");
    }

    #[tokio::test]
    async fn test_create_with_missing_dealer_publishes_nothing() {
        let mut store = MockCarStore::new();
        store
            .expect_create()
            .returning(|data| Err(DomainError::dealer_not_found(data.dealer_id)));

        let mut publisher = MockCarEventPublisher::new();
        publisher.expect_publish().never();

        let err = decorate(store, publisher)
            .create(new_camry(999))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DependencyNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_of_missing_car_publishes_nothing() {
        let mut store = MockCarStore::new();
        store
            .expect_update()
            .with(eq(5), mockall::predicate::always())
            .returning(|_, _| Ok(None));

        let mut publisher = MockCarEventPublisher::new();
        publisher.expect_publish().never();

        let result = decorate(store, publisher).update(5, new_camry(1)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_publishes_update_event() {
        let mut store = MockCarStore::new();
        store
            .expect_update()
            .returning(|id, data| Ok(Some(data.into_car(id))));

        let mut publisher = MockCarEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|event| event.event_type() == CarEventType::Update && event.car_id() == 3)
            .times(1)
            .returning(|_| ());

        let result = decorate(store, publisher).update(3, new_camry(1)).await.unwrap();
        assert_eq!(result.map(|c| c.id), Some(3));
    }

    #[tokio::test]
    async fn test_delete_fetches_before_deleting_and_uses_snapshot() {
        let mut seq = Sequence::new();
        let mut store = MockCarStore::new();
        store
            .expect_get()
            .with(eq(7))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id| {
                let mut car = new_camry(1).into_car(id);
                car.price = None;
                Ok(Some(car))
            });
        store
            .expect_delete()
            .with(eq(7))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        let mut publisher = MockCarEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|event| {
                event.event_type() == CarEventType::Delete
                    && event.car_id() == 7
                    && event.car().firm == "Toyota"
                    && event.car().price.is_none()
            })
            .times(1)
            .returning(|_| ());

        assert!(decorate(store, publisher).delete(7).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_of_missing_car_publishes_nothing() {
        let mut store = MockCarStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_delete().returning(|_| Ok(false));

        let mut publisher = MockCarEventPublisher::new();
        publisher.expect_publish().never();

        assert!(!decorate(store, publisher).delete(7).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_get_pass_through() {
        let mut store = MockCarStore::new();
        store
            .expect_list()
            .times(1)
            .returning(|| Ok(vec![new_camry(1).into_car(1), new_camry(1).into_car(2)]));
        store.expect_get().with(eq(2)).returning(|id| Ok(Some(new_camry(1).into_car(id))));

        let mut publisher = MockCarEventPublisher::new();
        publisher.expect_publish().never();

        let decorated = decorate(store, publisher);
        assert_eq!(decorated.list().await.unwrap().len(), 2);
        assert_eq!(decorated.get(2).await.unwrap().map(|c| c.id), Some(2));
    }
}
