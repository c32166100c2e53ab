use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::model::payroll::SalaryBasis;

const MAX_EMPLOYEES: u64 = 100_000;

/// Salary bases keyed by employee id.
///
/// Entries expire after the configured TTL; writes to an employee's salary
/// must call [`SalaryCache::invalidate`] after the write commits.
///
/// Every invalidation bumps a generation counter. A value read from the
/// database under an older generation may predate the write, so
/// [`SalaryCache::insert_loaded`] evicts it again.
#[derive(Clone)]
pub struct SalaryCache {
    inner: Cache<u64, SalaryBasis>,
    generation: Arc<AtomicU64>,
}

impl SalaryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_EMPLOYEES)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Take before reading a salary basis from the database.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn get(&self, employee_id: u64) -> Option<SalaryBasis> {
        self.inner.get(&employee_id).await
    }

    /// Caches a basis read from the database while the generation was
    /// `seen`. Returns false when an invalidation ran in between and the
    /// entry was dropped.
    pub async fn insert_loaded(&self, employee_id: u64, basis: SalaryBasis, seen: u64) -> bool {
        self.inner.insert(employee_id, basis).await;

        // Checked after the insert: an invalidation landing later removes it anyway.
        if self.generation() != seen {
            self.inner.invalidate(&employee_id).await;
            return false;
        }
        true
    }

    pub async fn invalidate(&self, employee_id: u64) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate(&employee_id).await;
    }

    /// Loads every employee's salary basis, `batch_size` rows at a time.
    pub async fn warmup(&self, pool: &MySqlPool, batch_size: usize) -> Result<()> {
        let seen = self.generation();
        let mut stream = sqlx::query_as::<_, (u64, f64, f64)>(
            "SELECT id, base_salary, special_salary FROM employees",
        )
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (id, base_salary, special_salary) = row?;
            batch.push((id, SalaryBasis { base_salary, special_salary }));
            total += 1;

            if batch.len() >= batch_size {
                self.insert_batch(&batch, seen).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch, seen).await;
        }

        log::info!("Salary cache warmup complete: {} employees", total);
        Ok(())
    }

    async fn insert_batch(&self, batch: &[(u64, SalaryBasis)], seen: u64) {
        let inserts: Vec<_> = batch
            .iter()
            .map(|(id, basis)| self.insert_loaded(*id, *basis, seen))
            .collect();

        futures::future::join_all(inserts).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn insert_get_invalidate() {
        let cache = SalaryCache::new(Duration::from_secs(60));
        let basis = SalaryBasis {
            base_salary: 31000.0,
            special_salary: 5000.0,
        };

        assert_eq!(cache.get(1).await, None);

        assert!(cache.insert_loaded(1, basis, cache.generation()).await);
        assert_eq!(cache.get(1).await, Some(basis));

        cache.invalidate(1).await;
        assert_eq!(cache.get(1).await, None);
    }

    #[actix_web::test]
    async fn load_overtaken_by_an_update_is_not_kept() {
        let cache = SalaryCache::new(Duration::from_secs(60));
        let stale = SalaryBasis {
            base_salary: 31000.0,
            special_salary: 5000.0,
        };

        // A read starts, the salary is updated and invalidated, then the
        // read finishes with the old row.
        let seen = cache.generation();
        cache.invalidate(1).await;
        assert!(!cache.insert_loaded(1, stale, seen).await);
        assert_eq!(cache.get(1).await, None);

        let seen = cache.generation();
        assert!(cache.insert_loaded(1, stale, seen).await);
        assert_eq!(cache.get(1).await, Some(stale));
    }
}
