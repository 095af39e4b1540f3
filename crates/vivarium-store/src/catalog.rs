//! The catalog repository: product CRUD plus the enumeration index.
//!
//! Products are keyed individually (`product:<id>`); enumeration goes
//! through `_index:products`, a JSON id array rebuilt by a full prefix scan
//! after every write. The index is a secondary cache: it is consistent with
//! the product keys only up to the last rebuild, and readers tolerate stale
//! entries by dropping fetch misses silently.

use std::sync::Arc;

use vivarium_core::{Product, ProductId};

use crate::error::Result;
use crate::keys;
use crate::kv::{from_bytes, to_bytes, Kv};

/// Repository for catalog products over the KV adapter.
#[derive(Clone)]
pub struct CatalogRepository {
    kv: Arc<dyn Kv>,
}

impl CatalogRepository {
    /// Create a repository over the given adapter.
    #[must_use]
    pub fn new(kv: Arc<dyn Kv>) -> Self {
        Self { kv }
    }

    /// Insert or replace a product, then rebuild the enumeration index.
    ///
    /// Prices arrive in separate price events, so an incoming record with
    /// no price keeps whatever price the stored record already carries; a
    /// redelivered product event must not erase a synced price.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn upsert(&self, product: &Product) -> Result<()> {
        let key = keys::product_key(&product.id);

        let mut record = product.clone();
        if record.price_cents.is_none() {
            if let Some(existing) = self.get(&product.id)? {
                record.price_cents = existing.price_cents;
                record.currency = existing.currency;
            }
        }

        self.kv.put(&key, &to_bytes(&record)?)?;
        tracing::info!(product_id = %record.id, name = %record.name, "Product upserted");

        self.rebuild_index()
    }

    /// Delete a product, then rebuild the enumeration index.
    ///
    /// Removing a product that does not exist is a no-op (delete events can
    /// be redelivered).
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn remove(&self, id: &ProductId) -> Result<()> {
        self.kv.delete(&keys::product_key(id))?;
        tracing::info!(product_id = %id, "Product removed");

        self.rebuild_index()
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        self.kv
            .get(&keys::product_key(id))?
            .map(|data| from_bytes(&data))
            .transpose()
    }

    /// Rebuild `_index:products` from a full scan of the product keys.
    ///
    /// O(n) over the catalog; acceptable at hundreds of items. The id array
    /// is sorted so rebuilds are deterministic.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn rebuild_index(&self) -> Result<()> {
        let mut ids: Vec<String> = self
            .kv
            .list(keys::PRODUCT_PREFIX)?
            .iter()
            .filter_map(|key| keys::product_id_from_key(key))
            .map(String::from)
            .collect();
        ids.sort_unstable();

        self.kv.put(keys::PRODUCT_INDEX, &to_bytes(&ids)?)?;
        tracing::debug!(count = ids.len(), "Product index rebuilt");

        Ok(())
    }

    /// List the catalog: read the index, fan-out fetch each product.
    ///
    /// A fetch miss (a deleted id still sitting in a stale index) is
    /// dropped silently, never surfaced as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn list(&self) -> Result<Vec<Product>> {
        let ids = self.index_ids()?;

        let mut products = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.kv.get(&format!("{}{id}", keys::PRODUCT_PREFIX))? {
                Some(data) => products.push(from_bytes(&data)?),
                None => {
                    tracing::debug!(product_id = %id, "Stale index entry, dropping");
                }
            }
        }

        Ok(products)
    }

    /// Read the raw id array from the index. Empty when no index exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn index_ids(&self) -> Result<Vec<String>> {
        match self.kv.get(keys::PRODUCT_INDEX)? {
            Some(data) => from_bytes(&data),
            None => Ok(Vec::new()),
        }
    }

    /// Apply a price event to an existing product.
    ///
    /// Price events can race ahead of the product-created event; when the
    /// product is not in the catalog yet this is a logged no-op, and the
    /// price lands with the eventual `product.updated` redelivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the store operation fails.
    pub fn update_price(
        &self,
        id: &ProductId,
        unit_amount_cents: i64,
        currency: &str,
    ) -> Result<()> {
        let Some(mut product) = self.get(id)? else {
            tracing::warn!(product_id = %id, "Price event for unknown product, skipping");
            return Ok(());
        };

        product.price_cents = Some(unit_amount_cents);
        product.currency = Some(currency.to_string());

        self.kv
            .put(&keys::product_key(id), &to_bytes(&product)?)?;
        tracing::info!(product_id = %id, price_cents = unit_amount_cents, currency, "Price updated");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::RocksKv;
    use tempfile::TempDir;
    use vivarium_core::ProviderMetadata;

    fn create_test_repo() -> (CatalogRepository, Arc<RocksKv>, TempDir) {
        let dir = TempDir::new().unwrap();
        let kv = Arc::new(RocksKv::open(dir.path()).unwrap());
        (CatalogRepository::new(kv.clone()), kv, dir)
    }

    fn product(id: &str, name: &str) -> Product {
        Product::from_provider(
            id.parse().unwrap(),
            name.into(),
            None,
            Vec::new(),
            ProviderMetadata::default(),
        )
    }

    #[test]
    fn upsert_get_remove() {
        let (repo, _kv, _dir) = create_test_repo();
        let p = product("prod_1", "Batman Ball");

        repo.upsert(&p).unwrap();
        assert_eq!(repo.get(&p.id).unwrap().unwrap().name, "Batman Ball");

        repo.remove(&p.id).unwrap();
        assert!(repo.get(&p.id).unwrap().is_none());

        // Redelivered delete is a no-op.
        repo.remove(&p.id).unwrap();
    }

    #[test]
    fn index_tracks_product_keys_after_sequential_ops() {
        let (repo, kv, _dir) = create_test_repo();

        repo.upsert(&product("prod_b", "B")).unwrap();
        repo.upsert(&product("prod_a", "A")).unwrap();
        repo.upsert(&product("prod_c", "C")).unwrap();
        repo.remove(&"prod_b".parse().unwrap()).unwrap();

        let ids = repo.index_ids().unwrap();
        assert_eq!(ids, vec!["prod_a", "prod_c"]);

        let keys: Vec<String> = kv
            .list(keys::PRODUCT_PREFIX)
            .unwrap()
            .iter()
            .filter_map(|k| keys::product_id_from_key(k))
            .map(String::from)
            .collect();
        assert_eq!(ids, keys);
    }

    #[test]
    fn list_drops_stale_index_entries_silently() {
        let (repo, kv, _dir) = create_test_repo();

        repo.upsert(&product("prod_1", "One")).unwrap();
        repo.upsert(&product("prod_2", "Two")).unwrap();

        // Simulate a delete that raced ahead of the index rebuild.
        kv.delete("product:prod_1").unwrap();

        let products = repo.list().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Two");
    }

    #[test]
    fn list_is_empty_without_an_index() {
        let (repo, _kv, _dir) = create_test_repo();
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn upsert_keeps_previously_synced_price() {
        let (repo, _kv, _dir) = create_test_repo();
        let p = product("prod_1", "One");

        repo.upsert(&p).unwrap();
        repo.update_price(&p.id, 45_000, "eur").unwrap();

        // Redelivered product event carries no price.
        repo.upsert(&product("prod_1", "One (renamed)")).unwrap();

        let stored = repo.get(&p.id).unwrap().unwrap();
        assert_eq!(stored.name, "One (renamed)");
        assert_eq!(stored.price_cents, Some(45_000));
        assert_eq!(stored.currency.as_deref(), Some("eur"));
    }

    #[test]
    fn update_price_on_existing_product() {
        let (repo, _kv, _dir) = create_test_repo();
        let p = product("prod_1", "One");
        repo.upsert(&p).unwrap();

        repo.update_price(&p.id, 100_000, "eur").unwrap();

        let updated = repo.get(&p.id).unwrap().unwrap();
        assert_eq!(updated.price_cents, Some(100_000));
        assert_eq!(updated.currency.as_deref(), Some("eur"));
        // Everything else untouched.
        assert_eq!(updated.name, "One");
    }

    #[test]
    fn price_event_ahead_of_product_is_a_noop() {
        let (repo, _kv, _dir) = create_test_repo();
        let id: ProductId = "prod_future".parse().unwrap();

        repo.update_price(&id, 5000, "eur").unwrap();
        assert!(repo.get(&id).unwrap().is_none());

        // Product arrives later; price applies then.
        repo.upsert(&product("prod_future", "Late")).unwrap();
        repo.update_price(&id, 5000, "eur").unwrap();
        assert_eq!(repo.get(&id).unwrap().unwrap().price_cents, Some(5000));
    }
}
