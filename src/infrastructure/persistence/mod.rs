//! Persistence implementations

pub mod memory;
#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "postgres")]
pub mod car_repository;
#[cfg(feature = "postgres")]
pub mod dealer_repository;

pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use database::{create_pool, run_migrations, DatabaseConfig};
#[cfg(feature = "postgres")]
pub use car_repository::PgCarStore;
#[cfg(feature = "postgres")]
pub use dealer_repository::PgDealerStore;
