use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::domain::order::OrderStatus;

// ============================================================================
// Metrics Module - Prometheus metrics for the order engine
// ============================================================================
//
// - Orders created / deleted
// - Items added and stock units reserved / restored
// - Status transitions by (from, to)
// - Rejected or failed operations by (operation, kind)
// - Operation latency
//
// Nothing is served over HTTP here; `render` produces the text exposition
// format for whatever surface embeds the engine.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub order_items_added: IntCounter,
    pub order_items_removed: IntCounter,
    pub orders_deleted: IntCounter,

    pub stock_units_reserved: IntCounter,
    pub stock_units_restored: IntCounter,

    pub status_transitions: IntCounterVec,
    pub operation_failures: IntCounterVec,
    pub operation_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_items_added = IntCounter::new("order_items_added_total", "Total items added to orders")?;
        registry.register(Box::new(order_items_added.clone()))?;

        let order_items_removed =
            IntCounter::new("order_items_removed_total", "Total items removed from orders")?;
        registry.register(Box::new(order_items_removed.clone()))?;

        let orders_deleted = IntCounter::new("orders_deleted_total", "Total orders deleted")?;
        registry.register(Box::new(orders_deleted.clone()))?;

        let stock_units_reserved = IntCounter::new(
            "stock_units_reserved_total",
            "Stock units taken from products by order items",
        )?;
        registry.register(Box::new(stock_units_reserved.clone()))?;

        let stock_units_restored = IntCounter::new(
            "stock_units_restored_total",
            "Stock units given back by cancellations and item removals",
        )?;
        registry.register(Box::new(stock_units_restored.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let operation_failures = IntCounterVec::new(
            Opts::new("order_operation_failures_total", "Order operations that returned an error"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(operation_failures.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("order_operation_duration_seconds", "Order operation duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_items_added,
            order_items_removed,
            orders_deleted,
            stock_units_reserved,
            stock_units_restored,
            status_transitions,
            operation_failures,
            operation_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_item_added(&self, quantity: u32) {
        self.order_items_added.inc();
        self.stock_units_reserved.inc_by(u64::from(quantity));
    }

    pub fn record_item_removed(&self, quantity: u32) {
        self.order_items_removed.inc();
        self.stock_units_restored.inc_by(u64::from(quantity));
    }

    pub fn record_stock_restored(&self, quantity: u32) {
        self.stock_units_restored.inc_by(u64::from(quantity));
    }

    pub fn record_transition(&self, from: OrderStatus, to: OrderStatus) {
        self.status_transitions.with_label_values(&[from.as_str(), to.as_str()]).inc();
    }

    pub fn record_failure(&self, operation: &str, kind: &str) {
        self.operation_failures.with_label_values(&[operation, kind]).inc();
    }

    pub fn observe_duration(&self, operation: &str, duration_secs: f64) {
        self.operation_duration.with_label_values(&[operation]).observe(duration_secs);
    }

    /// Text exposition of everything in the registry
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
