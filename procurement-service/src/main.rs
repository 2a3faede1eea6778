use procurement_service::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    tracing::info!(
        environment = %config.service.environment,
        "Starting procurement service"
    );

    let service = build(config).await?;
    service.serve().await?;
    Ok(())
}

#[cfg(feature = "database")]
async fn build(config: Config) -> Result<ProcurementService> {
    let Some(db) = config.database.clone() else {
        tracing::warn!("No database configured, records are kept in memory");
        return in_memory(config);
    };

    let pool = create_pool(&db).await?;
    let mut builder = ServiceBuilder::new(config.clone());
    for descriptor in procurement_service::catalog::enabled(&config.resources.enabled) {
        let store = PgRecordStore::new(pool.clone(), &descriptor);
        store.ensure_table().await?;
        builder = builder.with_resource(ResourceEngine::new(descriptor, store));
    }
    builder.build()
}

#[cfg(not(feature = "database"))]
async fn build(config: Config) -> Result<ProcurementService> {
    if config.database.is_some() {
        tracing::warn!("Database configured but the `database` feature is disabled, using memory storage");
    }
    in_memory(config)
}

fn in_memory(config: Config) -> Result<ProcurementService> {
    ServiceBuilder::new(config)
        .with_catalog(|_| MemoryRecordStore::new())
        .build()
}
