use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::{PoisonError, RwLock};

/// Expected capacity and false-positive rate for employee codes.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMPLOYEE_CODE_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Codes are compared case-insensitively and without surrounding spaces.
#[inline]
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Whether the code might already be taken (false positives possible).
pub fn might_exist(code: &str) -> bool {
    let code = normalize(code);
    EMPLOYEE_CODE_FILTER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains(&code)
}

pub fn insert(code: &str) {
    let code = normalize(code);
    EMPLOYEE_CODE_FILTER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .add(&code);
}

pub fn remove(code: &str) {
    let code = normalize(code);
    EMPLOYEE_CODE_FILTER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&code);
}

/// Streams every stored employee code into the filter.
pub async fn warmup_employee_code_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, (String,)>("SELECT employee_code FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&code));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Employee code filter warmup complete: {} codes", total);
    Ok(())
}

fn insert_batch(codes: &[String]) {
    let mut filter = EMPLOYEE_CODE_FILTER
        .write()
        .unwrap_or_else(PoisonError::into_inner);

    for code in codes {
        filter.add(code);
    }
}
