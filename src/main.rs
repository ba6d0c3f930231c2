use std::sync::Arc;

use rust_decimal::Decimal;

use retail_orders::config::AppConfig;
use retail_orders::domain::catalog::Catalog;
use retail_orders::domain::order::OrderEngine;
use retail_orders::domain::product::NewProduct;
use retail_orders::domain::user::NewUser;
use retail_orders::metrics::Metrics;
use retail_orders::store::InMemoryDatabase;
use retail_orders::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    telemetry::init(&config.logging)?;

    tracing::info!("🚀 Starting order lifecycle demo");

    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    let db = InMemoryDatabase::new();
    let catalog = Catalog::new(db.clone());
    let engine = OrderEngine::new(db, Arc::clone(&metrics));

    // === 1. Seed catalog ===
    let user = catalog
        .create_user(NewUser::new("demo", "demo@example.com").with_name("Demo", "User"))
        .await?;
    let product = catalog
        .create_product(
            NewProduct::new("Widget", Decimal::new(5000, 2), config.demo.demo_stock, "Tools", "WID-001")
                .with_description("Demo product"),
        )
        .await?;

    // === 2. Create order and reserve stock ===
    let order = engine.create_order(user.id, "123 Main St").await?;
    tracing::info!(order_id = %order.id, status = %order.status(), "✅ Order created");

    let order = engine
        .add_item_to_order(order.id, product.id, config.demo.demo_quantity)
        .await?;
    let reserved = catalog.product(product.id).await?;
    tracing::info!(
        total = %order.total_amount(),
        stock_before = product.stock_quantity,
        stock_after = reserved.stock_quantity,
        "✅ Item added"
    );

    // === 3. Confirm, then cancel and restore stock ===
    let order = engine.confirm_order(order.id).await?;
    tracing::info!(status = %order.status(), "✅ Order confirmed");

    let order = engine.cancel_order(order.id).await?;
    let restored = catalog.product(product.id).await?;
    tracing::info!(
        status = %order.status(),
        stock_after = restored.stock_quantity,
        "✅ Order cancelled"
    );

    // === 4. Drain the outbox ===
    let messages = engine.take_outbox(config.demo.outbox_batch).await?;
    for message in &messages {
        tracing::debug!(event_type = %message.event_type, payload = %message.payload, "Outbox message");
    }
    tracing::info!(
        taken = messages.len(),
        remaining = engine.outbox_messages().await?.len(),
        "📬 Outbox drained"
    );

    println!("{}", metrics.render()?);

    tracing::info!("🎉 Demo complete!");

    Ok(())
}
