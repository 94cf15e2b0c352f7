use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};

use super::{OrderStore, StoreError};
use crate::domain::order::{Delivery, Item, Order, Payment};

// ============================================================================
// PostgreSQL Order Store
// ============================================================================
//
// Four record sets keyed by order_uid:
//   orders   (root, 1)
//   delivery (1:1)
//   payment  (1:1)
//   items    (1:N, ordered by surrogate id)
//
// Writes go through a single transaction per aggregate. Reads rebuild the
// aggregate from its four parts.
//
// ============================================================================

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        order_uid          TEXT PRIMARY KEY,
        track_number       TEXT NOT NULL,
        entry              TEXT NOT NULL DEFAULT '',
        locale             TEXT NOT NULL DEFAULT '',
        internal_signature TEXT NOT NULL DEFAULT '',
        customer_id        TEXT NOT NULL DEFAULT '',
        delivery_service   TEXT NOT NULL DEFAULT '',
        shardkey           TEXT NOT NULL DEFAULT '',
        sm_id              INTEGER NOT NULL DEFAULT 0,
        date_created       TIMESTAMPTZ NOT NULL,
        oof_shard          TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS delivery (
        order_uid TEXT PRIMARY KEY REFERENCES orders (order_uid) ON DELETE CASCADE,
        name      TEXT NOT NULL,
        phone     TEXT NOT NULL DEFAULT '',
        zip       TEXT NOT NULL DEFAULT '',
        city      TEXT NOT NULL DEFAULT '',
        address   TEXT NOT NULL DEFAULT '',
        region    TEXT NOT NULL DEFAULT '',
        email     TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS payment (
        order_uid     TEXT PRIMARY KEY REFERENCES orders (order_uid) ON DELETE CASCADE,
        transaction   TEXT NOT NULL DEFAULT '',
        request_id    TEXT NOT NULL DEFAULT '',
        currency      TEXT NOT NULL DEFAULT '',
        provider      TEXT NOT NULL DEFAULT '',
        amount        BIGINT NOT NULL DEFAULT 0,
        payment_dt    BIGINT NOT NULL DEFAULT 0,
        bank          TEXT NOT NULL DEFAULT '',
        delivery_cost BIGINT NOT NULL DEFAULT 0,
        goods_total   BIGINT NOT NULL DEFAULT 0,
        custom_fee    BIGINT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS items (
        id           BIGSERIAL PRIMARY KEY,
        order_uid    TEXT NOT NULL REFERENCES orders (order_uid) ON DELETE CASCADE,
        chrt_id      BIGINT NOT NULL DEFAULT 0,
        track_number TEXT NOT NULL DEFAULT '',
        price        BIGINT NOT NULL DEFAULT 0,
        rid          TEXT NOT NULL DEFAULT '',
        name         TEXT NOT NULL DEFAULT '',
        sale         INTEGER NOT NULL DEFAULT 0,
        size         TEXT NOT NULL DEFAULT '',
        total_price  BIGINT NOT NULL DEFAULT 0,
        nm_id        BIGINT NOT NULL DEFAULT 0,
        brand        TEXT NOT NULL DEFAULT '',
        status       INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS items_order_uid_idx ON items (order_uid)",
];

const ORDER_COLUMNS: &str = "order_uid, track_number, entry, locale, internal_signature, \
     customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard";
const DELIVERY_COLUMNS: &str = "order_uid, name, phone, zip, city, address, region, email";
const PAYMENT_COLUMNS: &str = "order_uid, transaction, request_id, currency, provider, amount, \
     payment_dt, bank, delivery_cost, goods_total, custom_fee";
const ITEM_COLUMNS: &str = "order_uid, chrt_id, track_number, price, rid, name, sale, size, \
     total_price, nm_id, brand, status";

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Open a connection pool and make sure the database answers
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        tracing::info!(max_connections = max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create the order tables if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!(tables = 4, "Order schema ready");
        Ok(())
    }

    async fn insert_aggregate(
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shardkey)
        .bind(order.sm_id)
        .bind(order.date_created)
        .bind(&order.oof_shard)
        .execute(&mut **tx)
        .await?;

        let delivery = &order.delivery;
        sqlx::query(&format!(
            "INSERT INTO delivery ({DELIVERY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(&order.order_uid)
        .bind(&delivery.name)
        .bind(&delivery.phone)
        .bind(&delivery.zip)
        .bind(&delivery.city)
        .bind(&delivery.address)
        .bind(&delivery.region)
        .bind(&delivery.email)
        .execute(&mut **tx)
        .await?;

        let payment = &order.payment;
        sqlx::query(&format!(
            "INSERT INTO payment ({PAYMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(&order.order_uid)
        .bind(&payment.transaction)
        .bind(&payment.request_id)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(payment.amount)
        .bind(payment.payment_dt)
        .bind(&payment.bank)
        .bind(payment.delivery_cost)
        .bind(payment.goods_total)
        .bind(payment.custom_fee)
        .execute(&mut **tx)
        .await?;

        let insert_item = format!(
            "INSERT INTO items ({ITEM_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        for item in &order.items {
            sqlx::query(&insert_item)
                .bind(&order.order_uid)
                .bind(item.chrt_id)
                .bind(&item.track_number)
                .bind(item.price)
                .bind(&item.rid)
                .bind(&item.name)
                .bind(item.sale)
                .bind(&item.size)
                .bind(item.total_price)
                .bind(item.nm_id)
                .bind(&item.brand)
                .bind(item.status)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Err(e) = Self::insert_aggregate(&mut tx, order).await {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(
                    order_uid = %order.order_uid,
                    error = %rollback_err,
                    "Rollback failed, transaction is discarded with the connection"
                );
            }
            return Err(e.into());
        }

        tx.commit().await?;

        tracing::debug!(
            order_uid = %order.order_uid,
            item_count = order.items.len(),
            "Persisted order aggregate"
        );
        Ok(())
    }

    async fn get_order_by_uid(&self, order_uid: &str) -> Result<Order, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_uid = $1"))
            .bind(order_uid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(order_uid.to_string()))?;
        let mut order = order_from_row(&row)?;

        let delivery = sqlx::query(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM delivery WHERE order_uid = $1"
        ))
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await?;
        match delivery {
            Some(row) => order.delivery = delivery_from_row(&row)?,
            None => tracing::warn!(order_uid = %order_uid, "Order has no delivery record"),
        }

        let payment = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment WHERE order_uid = $1"
        ))
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await?;
        match payment {
            Some(row) => order.payment = payment_from_row(&row)?,
            None => tracing::warn!(order_uid = %order_uid, "Order has no payment record"),
        }

        order.items = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE order_uid = $1 ORDER BY id"
        ))
        .bind(order_uid)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(item_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(order)
    }

    async fn get_all_orders(&self) -> Result<Vec<Order>, StoreError> {
        let roots = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_uid"))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        if roots.is_empty() {
            return Ok(roots);
        }

        let deliveries = sqlx::query(&format!("SELECT {DELIVERY_COLUMNS} FROM delivery"))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| Ok((row.try_get("order_uid")?, delivery_from_row(row)?)))
            .collect::<Result<HashMap<String, Delivery>, sqlx::Error>>()?;

        let payments = sqlx::query(&format!("SELECT {PAYMENT_COLUMNS} FROM payment"))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| Ok((row.try_get("order_uid")?, payment_from_row(row)?)))
            .collect::<Result<HashMap<String, Payment>, sqlx::Error>>()?;

        let mut items: HashMap<String, Vec<Item>> = HashMap::new();
        let item_rows = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        for row in &item_rows {
            let order_uid: String = row.try_get("order_uid")?;
            items.entry(order_uid).or_default().push(item_from_row(row)?);
        }

        let orders = assemble_orders(roots, deliveries, payments, items);
        tracing::debug!(count = orders.len(), "Loaded all order aggregates");
        Ok(orders)
    }
}

/// Attach delivery, payment and items to their roots.
/// Missing 1:1 parts are left empty and reported.
fn assemble_orders(
    roots: Vec<Order>,
    mut deliveries: HashMap<String, Delivery>,
    mut payments: HashMap<String, Payment>,
    mut items: HashMap<String, Vec<Item>>,
) -> Vec<Order> {
    roots
        .into_iter()
        .map(|mut order| {
            match deliveries.remove(&order.order_uid) {
                Some(delivery) => order.delivery = delivery,
                None => tracing::warn!(order_uid = %order.order_uid, "Order has no delivery record"),
            }
            match payments.remove(&order.order_uid) {
                Some(payment) => order.payment = payment,
                None => tracing::warn!(order_uid = %order.order_uid, "Order has no payment record"),
            }
            order.items = items.remove(&order.order_uid).unwrap_or_default();
            order
        })
        .collect()
}

fn order_from_row(row: &PgRow) -> Result<Order, sqlx::Error> {
    Ok(Order {
        order_uid: row.try_get("order_uid")?,
        track_number: row.try_get("track_number")?,
        entry: row.try_get("entry")?,
        locale: row.try_get("locale")?,
        internal_signature: row.try_get("internal_signature")?,
        customer_id: row.try_get("customer_id")?,
        delivery_service: row.try_get("delivery_service")?,
        shardkey: row.try_get("shardkey")?,
        sm_id: row.try_get("sm_id")?,
        date_created: row.try_get("date_created")?,
        oof_shard: row.try_get("oof_shard")?,
        ..Default::default()
    })
}

fn delivery_from_row(row: &PgRow) -> Result<Delivery, sqlx::Error> {
    Ok(Delivery {
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        zip: row.try_get("zip")?,
        city: row.try_get("city")?,
        address: row.try_get("address")?,
        region: row.try_get("region")?,
        email: row.try_get("email")?,
    })
}

fn payment_from_row(row: &PgRow) -> Result<Payment, sqlx::Error> {
    Ok(Payment {
        transaction: row.try_get("transaction")?,
        request_id: row.try_get("request_id")?,
        currency: row.try_get("currency")?,
        provider: row.try_get("provider")?,
        amount: row.try_get("amount")?,
        payment_dt: row.try_get("payment_dt")?,
        bank: row.try_get("bank")?,
        delivery_cost: row.try_get("delivery_cost")?,
        goods_total: row.try_get("goods_total")?,
        custom_fee: row.try_get("custom_fee")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<Item, sqlx::Error> {
    Ok(Item {
        chrt_id: row.try_get("chrt_id")?,
        track_number: row.try_get("track_number")?,
        price: row.try_get("price")?,
        rid: row.try_get("rid")?,
        name: row.try_get("name")?,
        sale: row.try_get("sale")?,
        size: row.try_get("size")?,
        total_price: row.try_get("total_price")?,
        nm_id: row.try_get("nm_id")?,
        brand: row.try_get("brand")?,
        status: row.try_get("status")?,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
//
// Statement execution needs a live PostgreSQL; these cover the pure parts.
//
// ============================================================================
