use async_trait::async_trait;
use common::{
    Currency, CustomerIdentity, FulfillmentStatus, ItemId, Money, OrderId, PaymentStatus,
    TransactionId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    InventoryLedger, Item, LedgerInsert, Order, OrderStore, PaymentLedger, PaymentRecord,
    ReconciliationLog, ReconciliationTask, Result, StoreError,
};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_item(row: PgRow) -> Result<Item> {
        Ok(Item {
            id: ItemId::new(row.try_get::<String, _>("id")?),
            stock: to_count(row.try_get("stock")?)?,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let fulfillment: String = row.try_get("fulfillment_status")?;
        let payment: String = row.try_get("payment_status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            item_id: ItemId::new(row.try_get::<String, _>("item_id")?),
            quantity: to_count(row.try_get("quantity")?)?,
            customer: CustomerIdentity::new(row.try_get::<String, _>("customer")?),
            fulfillment_status: fulfillment
                .parse::<FulfillmentStatus>()
                .map_err(|e| StoreError::InvalidData(e.to_string()))?,
            payment_status: payment
                .parse::<PaymentStatus>()
                .map_err(|e| StoreError::InvalidData(e.to_string()))?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_payment(row: PgRow) -> Result<PaymentRecord> {
        let currency: String = row.try_get("currency")?;

        Ok(PaymentRecord {
            transaction_id: TransactionId::new(row.try_get::<String, _>("transaction_id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            currency: Currency::parse(&currency)
                .map_err(|e| StoreError::InvalidData(e.to_string()))?,
            confirmed_at: row.try_get("confirmed_at")?,
        })
    }
}

fn to_count(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("count out of range: {value}")))
}

#[async_trait]
impl InventoryLedger for PostgresStore {
    async fn reserve(&self, item_id: &ItemId, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        // The WHERE clause is the reservation check; Postgres evaluates it
        // against the row it locks, so concurrent decrements cannot both pass.
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE items
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(item_id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(stock) = remaining {
            return to_count(stock);
        }

        // Rejected: read only to explain why.
        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM items WHERE id = $1")
            .bind(item_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match available {
            Some(stock) => Err(StoreError::InsufficientStock {
                item_id: item_id.clone(),
                available: to_count(stock)?,
                requested: quantity,
            }),
            None => Err(StoreError::ItemNotFound(item_id.clone())),
        }
    }

    async fn restore(&self, item_id: &ItemId, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let stock: Option<i64> = sqlx::query_scalar(
            "UPDATE items SET stock = stock + $2 WHERE id = $1 RETURNING stock",
        )
        .bind(item_id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        match stock {
            Some(stock) => to_count(stock),
            None => Err(StoreError::ItemNotFound(item_id.clone())),
        }
    }

    async fn upsert_item(&self, item: Item) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, stock, price_cents)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                stock = EXCLUDED.stock,
                price_cents = EXCLUDED.price_cents
            "#,
        )
        .bind(item.id.as_str())
        .bind(i64::from(item.stock))
        .bind(item.price.cents())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_item(&self, item_id: &ItemId) -> Result<Option<Item>> {
        let row = sqlx::query("SELECT id, stock, price_cents FROM items WHERE id = $1")
            .bind(item_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_item).transpose()
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create_order(&self, order: Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders
                (id, item_id, quantity, customer, fulfillment_status, payment_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.item_id.as_str())
        .bind(i64::from(order.quantity))
        .bind(order.customer.as_str())
        .bind(order.fulfillment_status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, item_id, quantity, customer, fulfillment_status, payment_status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn orders_for_customer(&self, customer: &CustomerIdentity) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, quantity, customer, fulfillment_status, payment_status, created_at
            FROM orders
            WHERE customer = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(customer.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn set_fulfillment_status(
        &self,
        order_id: OrderId,
        status: FulfillmentStatus,
    ) -> Result<Order> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET fulfillment_status = $2
            WHERE id = $1
            RETURNING
                id, item_id, quantity, customer, fulfillment_status, payment_status, created_at
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order)
            .transpose()?
            .ok_or(StoreError::OrderNotFound(order_id))
    }

    async fn mark_paid(&self, order_id: OrderId) -> Result<Order> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = 'paid'
            WHERE id = $1
            RETURNING
                id, item_id, quantity, customer, fulfillment_status, payment_status, created_at
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order)
            .transpose()?
            .ok_or(StoreError::OrderNotFound(order_id))
    }
}

#[async_trait]
impl PaymentLedger for PostgresStore {
    async fn record(&self, record: PaymentRecord) -> Result<LedgerInsert> {
        // The primary key on transaction_id decides the winner; losers get no row back.
        let inserted: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO payments (transaction_id, order_id, amount_cents, currency, confirmed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (transaction_id) DO NOTHING
            RETURNING transaction_id
            "#,
        )
        .bind(record.transaction_id.as_str())
        .bind(record.order_id.as_uuid())
        .bind(record.amount.cents())
        .bind(record.currency.as_str())
        .bind(record.confirmed_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(_) => LedgerInsert::Inserted,
            None => LedgerInsert::Duplicate,
        })
    }

    async fn get_payment(&self, transaction_id: &TransactionId) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT transaction_id, order_id, amount_cents, currency, confirmed_at
            FROM payments
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn payments_for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, order_id, amount_cents, currency, confirmed_at
            FROM payments
            WHERE order_id = $1
            ORDER BY confirmed_at ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }
}

#[async_trait]
impl ReconciliationLog for PostgresStore {
    async fn log_task(&self, task: ReconciliationTask) -> Result<()> {
        let kind = serde_json::to_value(&task.kind)?;

        sqlx::query(
            r#"
            INSERT INTO reconciliation_tasks (id, kind, detail, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(task.id)
        .bind(kind)
        .bind(&task.detail)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn tasks(&self) -> Result<Vec<ReconciliationTask>> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, detail, created_at
            FROM reconciliation_tasks
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<ReconciliationTask> {
                let kind: serde_json::Value = row.try_get("kind")?;
                Ok(ReconciliationTask {
                    id: row.try_get("id")?,
                    kind: serde_json::from_value(kind)?,
                    detail: row.try_get("detail")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}
