//! Vector store: collection lifecycle, insertion, and similarity queries
//!
//! One store owns a sled database under its data directory. Each collection
//! maps to one row tree plus one HNSW index file; collection schemas live in
//! a shared metadata tree and are reloaded on open.

mod collection;
mod metric;

pub use collection::{Collection, CollectionMeta};
pub use metric::Metric;

use anyhow::{anyhow, Context};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::{Embedding, ScoredEntry};

use collection::IndexParams;

/// Entry counts and schema for one collection, for stats reporting
#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub name: String,
    pub content_column: String,
    pub dimension: usize,
    pub metric: Metric,
    pub entries: usize,
}

pub struct VectorStore {
    db: sled::Db,
    /// Shared metadata: `{name}:meta` schema records, `{name}:next_id` counters
    meta: sled::Tree,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    data_dir: PathBuf,
    params: IndexParams,
}

impl VectorStore {
    /// Open the store, reloading every previously created collection
    pub fn open(data_dir: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let db = sled::open(data_dir.join("store.sled"))
            .with_context(|| format!("failed to open store at {}", data_dir.display()))?;
        let meta = db
            .open_tree("collections")
            .context("failed to open collection metadata tree")?;

        let params = IndexParams {
            connectivity: config.hnsw_m,
            expansion_add: config.hnsw_ef_construction,
            expansion_search: config.hnsw_ef_search,
            max_capacity: config.max_capacity,
        };

        let store = Self {
            db,
            meta,
            collections: RwLock::new(HashMap::new()),
            data_dir,
            params,
        };
        store.reload_collections()?;
        Ok(store)
    }

    fn reload_collections(&self) -> Result<()> {
        let mut loaded = 0;
        for item in self.meta.iter() {
            let (key, value) = item.context("failed to scan collection metadata")?;
            let key = String::from_utf8(key.to_vec())
                .context("invalid collection metadata key")?;
            let Some(_name) = key.strip_suffix(":meta") else {
                continue;
            };
            let meta: CollectionMeta = serde_json::from_slice(&value)
                .with_context(|| format!("corrupt metadata for '{key}'"))?;
            let collection = Collection::open(
                &self.db,
                &self.meta,
                &self.data_dir,
                meta.clone(),
                &self.params,
            )?;
            self.collections
                .write()
                .insert(meta.name.clone(), Arc::new(collection));
            loaded += 1;
        }
        if loaded > 0 {
            info!(collections = loaded, "reloaded collections");
        }
        Ok(())
    }

    /// Create a collection with a fixed dimension and metric
    ///
    /// Idempotent: if a collection with this name already exists, the call
    /// is a no-op and the existing table and index are left untouched.
    pub fn create_collection(
        &self,
        name: &str,
        content_column: &str,
        dimension: usize,
        metric: Metric,
    ) -> Result<()> {
        if self.collections.read().contains_key(name) {
            debug!(collection = name, "collection already exists");
            return Ok(());
        }
        if dimension == 0 {
            return Err(Error::Backend(anyhow!(
                "collection dimension must be positive"
            )));
        }

        let meta = CollectionMeta {
            name: name.to_string(),
            content_column: content_column.to_string(),
            dimension,
            metric,
        };
        let collection = Collection::open(
            &self.db,
            &self.meta,
            &self.data_dir,
            meta.clone(),
            &self.params,
        )?;

        let mut collections = self.collections.write();
        // A concurrent creator may have won the race; first one in wins
        if collections.contains_key(name) {
            return Ok(());
        }

        let record = serde_json::to_vec(&meta).context("failed to serialize collection metadata")?;
        self.meta
            .insert(format!("{name}:meta").into_bytes(), record)
            .context("failed to persist collection metadata")?;
        self.meta
            .flush()
            .context("failed to flush collection metadata")?;

        collections.insert(name.to_string(), Arc::new(collection));
        info!(collection = name, dimension, metric = %metric, "created collection");
        Ok(())
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownCollection(name.to_string()))
    }

    /// Check the addressed column against the collection schema
    fn check_column(collection: &Collection, content_column: &str) -> Result<()> {
        let expected = &collection.meta().content_column;
        if content_column != expected {
            return Err(Error::Backend(anyhow!(
                "collection '{}' has no column '{}' (content column is '{}')",
                collection.meta().name,
                content_column,
                expected
            )));
        }
        Ok(())
    }

    /// Insert one row, returning the generated id
    pub fn insert(
        &self,
        collection_name: &str,
        content_column: &str,
        content: &str,
        embedding: &Embedding,
    ) -> Result<u64> {
        let collection = self.collection(collection_name)?;
        Self::check_column(&collection, content_column)?;
        let id = collection.insert(content, embedding)?;
        collection.save_index()?;
        Ok(id)
    }

    /// Retrieve the `top_k` nearest entries, closest first
    pub fn query(
        &self,
        collection_name: &str,
        content_column: &str,
        query_embedding: &Embedding,
        top_k: usize,
        metric: Metric,
    ) -> Result<Vec<ScoredEntry>> {
        let collection = self.collection(collection_name)?;
        Self::check_column(&collection, content_column)?;
        collection.query(query_embedding, top_k, metric)
    }

    /// Number of entries in a collection
    pub fn len(&self, collection_name: &str) -> Result<usize> {
        Ok(self.collection(collection_name)?.len())
    }

    /// Schema and entry counts for every collection
    pub fn stats(&self) -> Vec<CollectionStats> {
        let mut stats: Vec<CollectionStats> = self
            .collections
            .read()
            .values()
            .map(|c| CollectionStats {
                name: c.meta().name.clone(),
                content_column: c.meta().content_column.clone(),
                dimension: c.meta().dimension,
                metric: c.meta().metric,
                entries: c.len(),
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}
