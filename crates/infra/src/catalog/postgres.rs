//! Postgres-backed catalog.
//!
//! Reads the `posts` table (hierarchy, titles, manual sort order) joined with
//! the `wc_products` table (type, prices, stock, shipping attributes). The
//! ports are synchronous, so the adapter owns a single-threaded runtime and
//! blocks on each query.

use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tokio::runtime::{Builder, Runtime};

use varistore_core::ProductId;
use varistore_products::{Dimensions, ProductRecord, ProductType, StockStatus, Variation};

use super::{CatalogQuery, ChildAttribute, ChildPredicate, OrderBy, ProductQuery, ProductRepository};
use crate::error::StoreError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        "ID"        BIGINT PRIMARY KEY,
        post_parent BIGINT NOT NULL DEFAULT 0,
        post_title  TEXT NOT NULL DEFAULT '',
        menu_order  INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS wc_products (
        product_id    BIGINT PRIMARY KEY REFERENCES posts ("ID") ON DELETE CASCADE,
        type          TEXT NOT NULL,
        sku           TEXT NOT NULL DEFAULT '',
        price         NUMERIC NULL,
        regular_price NUMERIC NULL,
        sale_price    NUMERIC NULL,
        stock_status  TEXT NOT NULL DEFAULT 'instock',
        weight        NUMERIC NULL,
        length        NUMERIC NULL,
        width         NUMERIC NULL,
        height        NUMERIC NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS posts_parent_order_idx ON posts (post_parent, menu_order, \"ID\")",
];

const SELECT_PRODUCT: &str = r#"
    SELECT posts."ID" AS id,
           posts.post_parent AS parent_id,
           posts.post_title AS name,
           posts.menu_order::BIGINT AS menu_order,
           products.type AS kind,
           products.sku,
           products.price,
           products.regular_price,
           products.sale_price,
           products.stock_status,
           products.weight,
           products.length,
           products.width,
           products.height
    FROM posts
    JOIN wc_products AS products ON products.product_id = posts."ID"
    WHERE posts."ID" = $1
"#;

pub struct PostgresCatalog {
    pool: PgPool,
    runtime: Runtime,
}

impl PostgresCatalog {
    /// Connect to `database_url` and make sure the catalog tables exist.
    pub fn connect(database_url: &str) -> Result<Self, StoreError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::backend(format!("failed to start runtime: {e}")))?;

        let pool = runtime.block_on(async {
            let pool = PgPool::connect(database_url).await?;
            for statement in SCHEMA {
                sqlx::query(statement).execute(&pool).await?;
            }
            Ok::<_, sqlx::Error>(pool)
        })?;

        tracing::info!("postgres catalog connected");
        Ok(Self { pool, runtime })
    }

    fn list_sql(query: &ProductQuery) -> String {
        let order = match query.order_by {
            OrderBy::MenuOrder => r#"posts.menu_order ASC, posts."ID" ASC"#,
            OrderBy::Id => r#"posts."ID" ASC"#,
        };
        format!(
            r#"
            SELECT posts."ID"
            FROM posts
            JOIN wc_products AS products ON products.product_id = posts."ID"
            WHERE posts.post_parent = $1
              AND products.type = $2
              AND ($3::TEXT IS NULL OR products.stock_status = $3)
            ORDER BY {order}
            LIMIT $4
            "#
        )
    }

    fn exists_sql(predicate: ChildPredicate) -> String {
        let condition = match predicate.attribute {
            ChildAttribute::Weight => "products.weight > 0",
            ChildAttribute::Dimensions => {
                "(products.length > 0 OR products.width > 0 OR products.height > 0)"
            }
            ChildAttribute::InStock => "products.stock_status = 'instock'",
        };
        let stock = if predicate.in_stock_only {
            " AND products.stock_status = 'instock'"
        } else {
            ""
        };
        format!(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM wc_products AS products
                JOIN posts ON products.product_id = posts."ID"
                WHERE posts.post_parent = $1
                  AND {condition}{stock}
            )
            "#
        )
    }
}

fn db_id(id: ProductId) -> Result<i64, StoreError> {
    i64::try_from(id.get()).map_err(|_| StoreError::backend(format!("product id {id} out of range")))
}

fn product_id(raw: i64) -> Result<ProductId, StoreError> {
    u64::try_from(raw)
        .map(ProductId::new)
        .map_err(|_| StoreError::backend(format!("negative product id {raw}")))
}

fn record_from_row(row: &PgRow) -> Result<ProductRecord, StoreError> {
    let kind: String = row.try_get("kind")?;
    let stock_status: String = row.try_get("stock_status")?;
    let parent: i64 = row.try_get("parent_id")?;

    let mut record = ProductRecord::new(product_id(row.try_get("id")?)?, kind.parse::<ProductType>()?);
    record.parent_id = if parent == 0 {
        None
    } else {
        Some(product_id(parent)?)
    };
    record.name = row.try_get("name")?;
    record.sku = row.try_get("sku")?;
    record.menu_order = row.try_get("menu_order")?;
    record.price = row.try_get("price")?;
    record.regular_price = row.try_get("regular_price")?;
    record.sale_price = row.try_get("sale_price")?;
    record.stock_status = stock_status.parse::<StockStatus>()?;
    record.weight = row.try_get("weight")?;
    record.dimensions = Dimensions {
        length: row.try_get("length")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
    };
    Ok(record)
}

impl ProductRepository for PostgresCatalog {
    fn read(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        let id = db_id(id)?;
        let row = self.runtime.block_on(
            sqlx::query(SELECT_PRODUCT)
                .bind(id)
                .fetch_optional(&self.pool),
        )?;
        row.as_ref().map(record_from_row).transpose()
    }
}

impl CatalogQuery for PostgresCatalog {
    fn find_products(&self, query: &ProductQuery) -> Result<Vec<ProductId>, StoreError> {
        let sql = Self::list_sql(query);
        let limit = query
            .limit
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX));
        let rows = self.runtime.block_on(
            sqlx::query(&sql)
                .bind(db_id(query.parent)?)
                .bind(query.kind.as_str())
                .bind(query.stock_status.map(StockStatus::as_str))
                .bind(limit)
                .fetch_all(&self.pool),
        )?;

        rows.iter()
            .map(|row| product_id(row.try_get(0)?))
            .collect()
    }

    fn get_variation(&self, id: ProductId) -> Result<Option<Variation>, StoreError> {
        Ok(self.read(id)?.and_then(Variation::from_record))
    }

    fn child_exists(&self, parent: ProductId, predicate: ChildPredicate) -> Result<bool, StoreError> {
        let sql = Self::exists_sql(predicate);
        let exists: bool = self.runtime.block_on(
            sqlx::query_scalar(&sql)
                .bind(db_id(parent)?)
                .fetch_one(&self.pool),
        )?;
        Ok(exists)
    }
}
