//! Vendor adapters.
//!
//! Every adapter implements [`dbbench_core::Backend`] for the relational
//! suite. Lookup keys are sampled from the live tables outside the timed
//! window and cached per backend.

pub mod sqlite;
pub mod unavailable;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use sqlite::SqliteBackend;
pub use unavailable::UnavailableBackend;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;

use dbbench_core::{OperationError, Params};

use crate::fixtures::DataGen;
use crate::suite::{BATCH_SIZE, DEFAULT_BATCH_SIZE};

/// Seed for the per-attempt data generator of every adapter.
pub(crate) const DATA_SEED: u64 = 42;

/// Most keys sampled from a table at once.
pub(crate) const KEY_SAMPLE: i64 = 1_000;

/// Row keys sampled from the users table.
#[derive(Debug, Default)]
pub(crate) struct KeyCache {
    ids: Vec<i64>,
    emails: Vec<String>,
}

impl KeyCache {
    /// A random user id, loading ids first if none are cached.
    pub fn id<F>(&mut self, gen: &mut DataGen, load: F) -> Result<i64, OperationError>
    where
        F: FnOnce() -> Result<Vec<i64>, OperationError>,
    {
        if self.ids.is_empty() {
            self.ids = load()?;
        }
        gen.pick(&self.ids)
            .copied()
            .ok_or_else(|| OperationError::NoData("users table is empty".to_string()))
    }

    /// A random user id that is removed from the cache so it is not picked again.
    pub fn take_id<F>(&mut self, gen: &mut DataGen, load: F) -> Result<i64, OperationError>
    where
        F: FnOnce() -> Result<Vec<i64>, OperationError>,
    {
        if self.ids.is_empty() {
            self.ids = load()?;
        }
        gen.index(self.ids.len())
            .map(|i| self.ids.swap_remove(i))
            .ok_or_else(|| OperationError::NoData("users table is empty".to_string()))
    }

    /// A random user email, loading emails first if none are cached.
    pub fn email<F>(&mut self, gen: &mut DataGen, load: F) -> Result<String, OperationError>
    where
        F: FnOnce() -> Result<Vec<String>, OperationError>,
    {
        if self.emails.is_empty() {
            self.emails = load()?;
        }
        gen.pick(&self.emails)
            .cloned()
            .ok_or_else(|| OperationError::NoData("users table is empty".to_string()))
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.emails.clear();
    }
}

/// Rows per `insert_batch` attempt.
pub(crate) fn batch_size(params: &Params) -> Result<usize, OperationError> {
    match params.get(BATCH_SIZE) {
        None => Ok(DEFAULT_BATCH_SIZE as usize),
        Some(value) => match value.as_u64() {
            Some(n) if n > 0 => Ok(n as usize),
            _ => Err(OperationError::Query(format!(
                "{} must be a positive integer, got {}",
                BATCH_SIZE, value
            ))),
        },
    }
}

/// Convert a driver error into a failed attempt.
pub(crate) fn query_error(e: impl std::fmt::Display) -> OperationError {
    OperationError::Query(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_param() {
        assert_eq!(batch_size(&Params::new()), Ok(50));
        assert_eq!(batch_size(&Params::new().with(BATCH_SIZE, 7)), Ok(7));
        assert!(batch_size(&Params::new().with(BATCH_SIZE, 0)).is_err());
        assert!(batch_size(&Params::new().with(BATCH_SIZE, "ten")).is_err());
    }

    #[test]
    fn test_key_cache_loads_once() {
        let mut cache = KeyCache::default();
        let mut gen = DataGen::new(DATA_SEED);
        let mut loads = 0;

        for _ in 0..5 {
            let id = cache
                .id(&mut gen, || {
                    loads += 1;
                    Ok(vec![1, 2, 3])
                })
                .unwrap();
            assert!((1..=3).contains(&id));
        }
        assert_eq!(loads, 1);
    }

    #[test]
    fn test_key_cache_take_drains() {
        let mut cache = KeyCache::default();
        let mut gen = DataGen::new(DATA_SEED);

        let mut taken: Vec<_> = (0..3)
            .map(|_| cache.take_id(&mut gen, || Ok(vec![10, 20, 30])).unwrap())
            .collect();
        taken.sort();
        assert_eq!(taken, vec![10, 20, 30]);

        let empty = cache.take_id(&mut gen, || Ok(Vec::new()));
        assert!(matches!(empty, Err(OperationError::NoData(_))));
    }
}
