use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{OrderStore, StoreError};
use crate::domain::order::Order;

/// Process-local store with the same contract as the Postgres backend.
/// Inserting an existing order_uid fails with `StoreError::Duplicate`.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<BTreeMap<String, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let orders = orders
            .into_iter()
            .map(|order| (order.order_uid.clone(), order))
            .collect();
        Self { orders: Mutex::new(orders) }
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.lock();
        if orders.contains_key(&order.order_uid) {
            return Err(StoreError::Duplicate(order.order_uid.clone()));
        }
        orders.insert(order.order_uid.clone(), order.clone());
        Ok(())
    }

    async fn get_order_by_uid(&self, order_uid: &str) -> Result<Order, StoreError> {
        self.orders
            .lock()
            .get(order_uid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(order_uid.to_string()))
    }

    async fn get_all_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.lock().values().cloned().collect())
    }
}
