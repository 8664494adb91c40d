use std::sync::{PoisonError, RwLock};

use tracing::info;

use tracker_catalog::{Catalog, SeedReport, seed};

/// Shared reference data. Readers never see a half-applied write.
#[derive(Debug, Default)]
pub struct CatalogStore {
    inner: RwLock<Catalog>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(catalog),
        }
    }

    /// Catalog with the default workshop data loaded.
    pub fn seeded() -> Self {
        let store = Self::default();
        store.seed();
        store
    }

    pub fn seed(&self) -> SeedReport {
        let report = self.write(seed);
        info!(created = report.total_created(), "catalog seeded");
        report
    }

    pub fn read<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut Catalog) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_twice_creates_nothing_new() {
        let store = CatalogStore::seeded();
        let before = store.read(|c| c.counts());
        assert_eq!(store.seed().total_created(), 0);
        assert_eq!(store.read(|c| c.counts()), before);
    }

    #[test]
    fn writes_are_visible_to_readers() {
        let store = CatalogStore::seeded();
        let remaining = store
            .write(|c| c.adjust_inventory("Car Battery 12V", "Yokohama", -1))
            .unwrap();
        assert_eq!(remaining, 7);
        let visible = store.read(|c| {
            c.active_inventory()
                .iter()
                .find(|i| i.name == "Car Battery 12V")
                .map(|i| i.quantity)
        });
        assert_eq!(visible, Some(7));
    }
}
