// ============================================================================
// Durable Store
// ============================================================================
//
// Capability interface for persisting and loading whole order aggregates.
// The pipeline only talks to `OrderStore`, so backends (Postgres, in-memory,
// test doubles) can be swapped without touching it.
//
// ============================================================================

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::order::Order;

pub use error::StoreError;
pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist the order with its delivery, payment and items as one atomic
    /// unit. Nothing is written if any part fails.
    async fn create_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Rebuild one aggregate. `StoreError::NotFound` if the root is absent.
    async fn get_order_by_uid(&self, order_uid: &str) -> Result<Order, StoreError>;

    /// Every committed aggregate. An empty store yields an empty Vec.
    async fn get_all_orders(&self) -> Result<Vec<Order>, StoreError>;
}
