//! Print the children listing, price table and attribute probes of variable
//! products as JSON lines.
//!
//! Usage: `varistore-prices [--include-taxes] [--refresh] <parent-id>...`

use std::sync::Arc;

use anyhow::{Context, bail};
use serde_json::json;

use varistore_core::ProductId;
use varistore_infra::cache::{InMemoryObjectCache, InMemoryTransientStore, TransientStore};
use varistore_infra::catalog::PostgresCatalog;
use varistore_infra::version::TransientVersionCounter;
use varistore_infra::{CatalogServices, StoreConfig};
use varistore_products::PriceFilters;

struct Args {
    include_taxes: bool,
    refresh: bool,
    parents: Vec<ProductId>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        include_taxes: false,
        refresh: false,
        parents: Vec::new(),
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--include-taxes" => args.include_taxes = true,
            "--refresh" => args.refresh = true,
            other => {
                let id = other
                    .parse::<ProductId>()
                    .with_context(|| format!("invalid parent id '{other}'"))?;
                args.parents.push(id);
            }
        }
    }
    if args.parents.is_empty() {
        bail!("usage: varistore-prices [--include-taxes] [--refresh] <parent-id>...");
    }
    Ok(args)
}

fn transient_store() -> anyhow::Result<Arc<dyn TransientStore>> {
    #[cfg(feature = "redis")]
    {
        if let Ok(redis_url) = std::env::var("REDIS_URL") {
            let store = varistore_infra::cache::redis::RedisTransientStore::open(&redis_url, "varistore")
                .context("failed to open redis transient store")?;
            tracing::info!("using redis transient store");
            return Ok(Arc::new(store));
        }
    }

    tracing::warn!("no shared transient store configured; caching is process-local");
    Ok(Arc::new(InMemoryTransientStore::new()))
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    varistore_observability::init();

    let args = parse_args()?;
    let config = StoreConfig::from_env().context("failed to load store configuration")?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let catalog = Arc::new(PostgresCatalog::connect(&database_url).context("failed to connect to postgres")?);
    let transients = transient_store()?;

    let services = CatalogServices {
        repository: catalog.clone(),
        catalog,
        versions: Arc::new(TransientVersionCounter::new(transients.clone())),
        transients,
        object_cache: Arc::new(InMemoryObjectCache::new()),
        filters: Arc::new(PriceFilters::new()),
        config,
    };

    let mut store = services.unit_of_work();
    tracing::info!(unit_of_work = %store.unit_of_work_id(), parents = args.parents.len(), "reading prices");

    for parent in args.parents {
        if args.refresh {
            store.clear_caches(parent)?;
        }
        let Some(product) = store
            .read_product(parent)
            .with_context(|| format!("failed to read product {parent}"))?
        else {
            tracing::warn!(%parent, "product not found");
            continue;
        };

        let table = store.get_price_table(&product, args.include_taxes)?;
        let line = json!({
            "id": parent,
            "children": product.children(),
            "visible_children": product.visible_children(),
            "price_range": table.min_price().zip(table.max_price()),
            "on_sale": table.is_on_sale(),
            "prices": table,
            "child_has_weight": store.child_has_weight(parent)?,
            "child_has_dimensions": store.child_has_dimensions(parent)?,
            "child_is_in_stock": store.child_is_in_stock(parent)?,
        });
        println!("{line}");
    }

    Ok(())
}
