use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::order::Order;

// ============================================================================
// Order Cache
// ============================================================================
//
// Read-optimized map from order_uid to the committed aggregate. Shared by the
// ingestion pipeline (writer) and the HTTP read path (reader).
//
// Concurrency:
// - one RwLock per cache instance
// - get / get_all / size take the shared lock
// - set / restore take the exclusive lock
// - no lock is ever held across an .await
//
// Restore is authoritative: a set that lands before the swap is discarded,
// one that lands after survives.
//
// ============================================================================

#[derive(Default)]
pub struct OrderCache {
    orders: RwLock<HashMap<String, Arc<Order>>>,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by order_uid, no version check
    pub fn set(&self, order: Order) {
        let order_uid = order.order_uid.clone();
        self.orders.write().insert(order_uid, Arc::new(order));
    }

    pub fn get(&self, order_uid: &str) -> Option<Arc<Order>> {
        self.orders.read().get(order_uid).cloned()
    }

    /// Point-in-time snapshot, in no particular order
    pub fn get_all(&self) -> Vec<Arc<Order>> {
        self.orders.read().values().cloned().collect()
    }

    /// Replace the whole contents with `orders`.
    ///
    /// The new map is built before the write lock is taken, so readers are
    /// only blocked for the swap itself.
    pub fn restore(&self, orders: Vec<Order>) {
        let replacement: HashMap<String, Arc<Order>> = orders
            .into_iter()
            .map(|order| (order.order_uid.clone(), Arc::new(order)))
            .collect();

        let previous = std::mem::replace(&mut *self.orders.write(), replacement);
        // old map is freed after the guard is released
        drop(previous);
    }

    pub fn size(&self) -> usize {
        self.orders.read().len()
    }
}

/// Read interface exposed to the HTTP surface
pub trait OrderLookup: Send + Sync {
    fn lookup(&self, order_uid: &str) -> Option<Arc<Order>>;

    fn snapshot_size(&self) -> usize;
}

impl OrderLookup for OrderCache {
    fn lookup(&self, order_uid: &str) -> Option<Arc<Order>> {
        self.get(order_uid)
    }

    fn snapshot_size(&self) -> usize {
        self.size()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
