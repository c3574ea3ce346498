use crate::metadata::error::MetadataError;
use crate::metadata::models::{FlagUpdate, ImageRecord, RecordFilter, RecordKey};
use crate::metadata::store::MetadataStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

fn condition_holds(update: &FlagUpdate, record: &ImageRecord) -> bool {
    update
        .expect_featured
        .map_or(true, |expected| record.featured == expected)
}

fn apply(update: &FlagUpdate, record: &mut ImageRecord) {
    if let Some(featured) = update.featured {
        record.featured = featured;
    }
    if let Some(removed) = update.removed {
        record.removed = removed;
    }
}

fn matches(filter: &RecordFilter, record: &ImageRecord) -> bool {
    (filter.include_removed || !record.removed)
        && filter.featured.map_or(true, |f| record.featured == f)
}

#[derive(Default)]
struct FailureBudget {
    gets: usize,
    puts: usize,
    updates: usize,
    queries: usize,
}

fn consume(counter: &mut usize) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

/// A fake in-memory implementation of the MetadataStore trait for testing
#[derive(Clone, Default)]
pub struct FakeMetadataStore {
    records: Arc<RwLock<BTreeMap<RecordKey, ImageRecord>>>,
    failures: Arc<Mutex<FailureBudget>>,
    put_count: Arc<Mutex<usize>>,
    interleaved: Arc<Mutex<Vec<(RecordKey, FlagUpdate)>>>,
}

#[allow(dead_code)]
impl FakeMetadataStore {
    /// Create a new empty FakeMetadataStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record directly, bypassing failure injection
    pub fn fake_add_record(&self, record: ImageRecord) {
        let mut records = self.records.write().unwrap();
        records.insert(record.key(), record);
    }

    /// All stored records, including removed ones, ordered by key
    pub fn fake_records(&self) -> Vec<ImageRecord> {
        self.records.read().unwrap().values().cloned().collect()
    }

    pub fn fake_record(&self, key: &RecordKey) -> Option<ImageRecord> {
        self.records.read().unwrap().get(key).cloned()
    }

    /// Number of successful put_record calls
    pub fn fake_put_count(&self) -> usize {
        *self.put_count.lock().unwrap()
    }

    pub fn fake_fail_gets(&self, count: usize) {
        self.failures.lock().unwrap().gets = count;
    }

    pub fn fake_fail_puts(&self, count: usize) {
        self.failures.lock().unwrap().puts = count;
    }

    pub fn fake_fail_updates(&self, count: usize) {
        self.failures.lock().unwrap().updates = count;
    }

    pub fn fake_fail_queries(&self, count: usize) {
        self.failures.lock().unwrap().queries = count;
    }

    /// Apply `update` to `key` just before the next update_flags call runs,
    /// as a concurrent writer would between a query and a conditional update
    pub fn fake_interleave_update(&self, key: RecordKey, update: FlagUpdate) {
        self.interleaved.lock().unwrap().push((key, update));
    }
}

#[async_trait]
impl MetadataStore for FakeMetadataStore {
    async fn get_record(&self, key: &RecordKey) -> Result<Option<ImageRecord>, MetadataError> {
        if consume(&mut self.failures.lock().unwrap().gets) {
            return Err(MetadataError::ReadError(format!(
                "Simulated read failure for {}",
                key
            )));
        }

        Ok(self.records.read().unwrap().get(key).cloned())
    }

    async fn put_record(&self, record: &ImageRecord) -> Result<(), MetadataError> {
        if consume(&mut self.failures.lock().unwrap().puts) {
            return Err(MetadataError::WriteError(format!(
                "Simulated write failure for {}",
                record.key()
            )));
        }

        self.records
            .write()
            .unwrap()
            .insert(record.key(), record.clone());
        *self.put_count.lock().unwrap() += 1;
        Ok(())
    }

    async fn create_record(&self, record: &ImageRecord) -> Result<(), MetadataError> {
        if consume(&mut self.failures.lock().unwrap().puts) {
            return Err(MetadataError::WriteError(format!(
                "Simulated write failure for {}",
                record.key()
            )));
        }

        let mut records = self.records.write().unwrap();
        if records.contains_key(&record.key()) {
            return Err(MetadataError::ConditionFailed(record.key().to_string()));
        }
        records.insert(record.key(), record.clone());
        *self.put_count.lock().unwrap() += 1;
        Ok(())
    }

    async fn update_flags(
        &self,
        key: &RecordKey,
        update: FlagUpdate,
    ) -> Result<(), MetadataError> {
        if consume(&mut self.failures.lock().unwrap().updates) {
            return Err(MetadataError::WriteError(format!(
                "Simulated update failure for {}",
                key
            )));
        }

        let interleaved: Vec<_> = self.interleaved.lock().unwrap().drain(..).collect();
        let mut records = self.records.write().unwrap();
        for (other_key, other_update) in &interleaved {
            if let Some(record) = records.get_mut(other_key) {
                apply(other_update, record);
            }
        }

        match records.get_mut(key) {
            Some(record) if condition_holds(&update, record) => {
                apply(&update, record);
                Ok(())
            }
            _ => Err(MetadataError::ConditionFailed(key.to_string())),
        }
    }

    async fn query_category(
        &self,
        category: &str,
        filter: RecordFilter,
    ) -> Result<Vec<ImageRecord>, MetadataError> {
        if consume(&mut self.failures.lock().unwrap().queries) {
            return Err(MetadataError::ReadError(format!(
                "Simulated query failure for {}",
                category
            )));
        }

        let records = self.records.read().unwrap();
        // Newest first, matching a descending sort-key scan
        Ok(records
            .values()
            .rev()
            .filter(|record| record.category == category && matches(&filter, record))
            .cloned()
            .collect())
    }
}
