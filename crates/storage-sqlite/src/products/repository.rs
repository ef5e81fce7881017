use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use pricepulse_core::errors::{DatabaseError, Error};
use pricepulse_core::products::{NewProduct, Product, ProductRepositoryTrait};
use pricepulse_core::Result;

use super::model::{NewProductDB, ProductDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::products;
use crate::schema::products::dsl::*;

pub struct ProductRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

fn not_found(product_id: i64) -> Error {
    Error::Database(DatabaseError::NotFound(format!(
        "Product {} not found",
        product_id
    )))
}

/// Fails with NotFound when an update touched no row.
fn expect_one_row(affected: usize, product_id: i64) -> Result<()> {
    if affected == 0 {
        return Err(not_found(product_id));
    }
    Ok(())
}

impl ProductRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ProductRepository { pool, writer }
    }
}

#[async_trait]
impl ProductRepositoryTrait for ProductRepository {
    async fn create(&self, new_product: NewProduct) -> Result<Product> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Product> {
                let row = NewProductDB::from_domain(&new_product, Utc::now().naive_utc());
                let result_db = diesel::insert_into(products::table)
                    .values(&row)
                    .returning(ProductDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Product::from(result_db))
            })
            .await
    }

    fn get_by_id(&self, product_id: i64) -> Result<Product> {
        let mut conn = get_connection(&self.pool)?;
        products
            .find(product_id)
            .select(ProductDB::as_select())
            .first::<ProductDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(Product::from)
            .ok_or_else(|| not_found(product_id))
    }

    async fn update_price(&self, product_id: i64, price: Decimal) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let affected = diesel::update(products.find(product_id))
                    .set((
                        current_price.eq(price.to_string()),
                        updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                expect_one_row(affected, product_id)
            })
            .await
    }

    fn get_all(&self) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let products_db = products
            .order(id.asc())
            .select(ProductDB::as_select())
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(products_db.into_iter().map(Product::from).collect())
    }

    fn list_page(&self, after_id: i64, limit: i64) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let products_db = products
            .filter(id.gt(after_id))
            .order(id.asc())
            .limit(limit)
            .select(ProductDB::as_select())
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(products_db.into_iter().map(Product::from).collect())
    }

    async fn update_title(&self, product_id: i64, new_title: &str) -> Result<()> {
        let new_title = new_title.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let affected = diesel::update(products.find(product_id))
                    .set((title.eq(new_title), updated_at.eq(Utc::now().naive_utc())))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                expect_one_row(affected, product_id)
            })
            .await
    }

    async fn update_target_price(&self, product_id: i64, new_target: Decimal) -> Result<Product> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Product> {
                let affected = diesel::update(products.find(product_id))
                    .set((
                        target_price.eq(new_target.to_string()),
                        updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                expect_one_row(affected, product_id)?;

                let result_db = products
                    .find(product_id)
                    .select(ProductDB::as_select())
                    .first::<ProductDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Product::from(result_db))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use pricepulse_core::constants::PLACEHOLDER_TITLE;
    use pricepulse_core::errors::ErrorKind;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    async fn create_test_repository() -> (ProductRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let pool = create_pool(&db_path_str).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());

        (ProductRepository::new(Arc::clone(&pool), writer), temp_dir)
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_defaults() {
        let (repo, _dir) = create_test_repository().await;

        let first = repo
            .create(NewProduct::new("http://x/1", dec!(50.00)))
            .await
            .unwrap();
        let second = repo
            .create(NewProduct::new("http://x/2", dec!(20)))
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.title, PLACEHOLDER_TITLE);
        assert_eq!(first.current_price, Decimal::ZERO);
        assert_eq!(first.target_price, dec!(50.00));
        assert_eq!(first.created_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_get_by_id_round_trips_decimals() {
        let (repo, _dir) = create_test_repository().await;
        let created = repo
            .create(NewProduct::new("http://x/1", dec!(49.99)))
            .await
            .unwrap();

        let loaded = repo.get_by_id(created.id).unwrap();

        assert_eq!(loaded, created);
        assert_eq!(loaded.target_price.to_string(), "49.99");
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let (repo, _dir) = create_test_repository().await;
        let err = repo.get_by_id(404).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_price_bumps_updated_at() {
        let (repo, _dir) = create_test_repository().await;
        let created = repo
            .create(NewProduct::new("http://x/1", dec!(50)))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        repo.update_price(created.id, dec!(45.00)).await.unwrap();

        let loaded = repo.get_by_id(created.id).unwrap();
        assert_eq!(loaded.current_price, dec!(45.00));
        assert!(loaded.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn test_update_price_missing_is_not_found() {
        let (repo, _dir) = create_test_repository().await;
        let err = repo.update_price(9, dec!(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_title_and_target() {
        let (repo, _dir) = create_test_repository().await;
        let created = repo
            .create(NewProduct::new("http://x/1", dec!(50)))
            .await
            .unwrap();

        repo.update_title(created.id, "Desk Lamp").await.unwrap();
        let updated = repo.update_target_price(created.id, dec!(40)).await.unwrap();

        assert_eq!(updated.title, "Desk Lamp");
        assert_eq!(updated.target_price, dec!(40));
        assert!(repo.update_title(77, "x").await.is_err());
        assert_eq!(
            repo.update_target_price(77, dec!(1)).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_list_page_and_get_all() {
        let (repo, _dir) = create_test_repository().await;
        for i in 1..=5 {
            repo.create(NewProduct::new(format!("http://x/{}", i), dec!(10)))
                .await
                .unwrap();
        }

        let page = repo.list_page(2, 2).unwrap();
        let tail = repo.list_page(4, 10).unwrap();

        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(tail.iter().map(|p| p.id).collect::<Vec<_>>(), vec![5]);
        assert_eq!(repo.get_all().unwrap().len(), 5);
    }
}
