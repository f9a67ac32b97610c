//! A single collection: sled row tree plus USearch similarity index
//!
//! Rows keep the full-precision f64 embeddings; the HNSW index holds an
//! F32-quantized copy for search. Ids are assigned from a persistent
//! counter, start at 1, and are never reused.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use usearch::{Index, IndexOptions, ScalarKind};

use super::Metric;
use crate::error::{Error, Result};
use crate::types::ScoredEntry;

/// HNSW construction parameters shared by all collections of a store
#[derive(Debug, Clone)]
pub(crate) struct IndexParams {
    pub connectivity: usize,
    pub expansion_add: usize,
    pub expansion_search: usize,
    pub max_capacity: usize,
}

/// Persistent description of a collection's schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub name: String,
    pub content_column: String,
    pub dimension: usize,
    pub metric: Metric,
}

/// Row payload stored in the sled tree, keyed by big-endian id
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    content: String,
    embedding: Vec<f64>,
}

pub struct Collection {
    meta: CollectionMeta,
    /// Row storage: 8-byte big-endian id -> bincode `StoredEntry`
    rows: sled::Tree,
    /// Store-wide metadata tree holding the persisted id counter
    store_meta: sled::Tree,
    index: Index,
    index_path: PathBuf,
    next_id: AtomicU64,
}

impl Collection {
    /// Open or create the collection's backing table and similarity index
    ///
    /// Both halves are idempotent: an existing row tree is reused as-is and
    /// an existing index file is loaded instead of rebuilt.
    pub(crate) fn open(
        db: &sled::Db,
        store_meta: &sled::Tree,
        data_dir: &Path,
        meta: CollectionMeta,
        params: &IndexParams,
    ) -> Result<Self> {
        let rows = db
            .open_tree(format!("rows:{}", meta.name))
            .with_context(|| format!("failed to open row tree for '{}'", meta.name))?;

        let options = IndexOptions {
            dimensions: meta.dimension,
            metric: meta.metric.index_kind(),
            quantization: ScalarKind::F32,
            connectivity: params.connectivity,
            expansion_add: params.expansion_add,
            expansion_search: params.expansion_search,
            multi: false,
        };

        let index = Index::new(&options)
            .with_context(|| format!("failed to create similarity index for '{}'", meta.name))?;

        let index_path = data_dir.join(format!("{}.usearch", meta.name));
        if index_path.exists() {
            let path_str = index_path
                .to_str()
                .ok_or_else(|| anyhow!("invalid index path: {}", index_path.display()))?;
            index
                .load(path_str)
                .with_context(|| format!("failed to load similarity index for '{}'", meta.name))?;
            // A loaded index only has capacity for its existing vectors
            let target = params.max_capacity.max(index.size() + 1024);
            index
                .reserve(target)
                .context("failed to reserve index capacity after load")?;
            debug!(
                collection = %meta.name,
                entries = index.size(),
                "loaded similarity index"
            );
        } else {
            index
                .reserve(params.max_capacity)
                .context("failed to reserve index capacity")?;
        }

        let next_id = Self::restore_next_id(&rows, store_meta, &meta.name)?;

        // Rows can be ahead of the index if a crash hit between the row
        // flush and the index save; re-add whatever is missing
        let mut reindexed = 0;
        for item in rows.iter() {
            let (key, value) = item.context("failed to scan rows")?;
            let bytes: [u8; 8] = key.as_ref().try_into().context("corrupt row key")?;
            let id = u64::from_be_bytes(bytes);
            if !index.contains(id) {
                let stored: StoredEntry = bincode::deserialize(&value)
                    .with_context(|| format!("failed to deserialize entry {id}"))?;
                let quantized: Vec<f32> = stored.embedding.iter().map(|&x| x as f32).collect();
                index
                    .add(id, &quantized)
                    .with_context(|| format!("failed to reindex entry {id}"))?;
                reindexed += 1;
            }
        }
        if reindexed > 0 {
            info!(collection = %meta.name, reindexed, "reindexed rows missing from the index");
        }

        info!(
            collection = %meta.name,
            dimension = meta.dimension,
            metric = %meta.metric,
            "collection ready"
        );

        Ok(Self {
            meta,
            rows,
            store_meta: store_meta.clone(),
            index,
            index_path,
            next_id: AtomicU64::new(next_id),
        })
    }

    /// Recover the id counter: the persisted value, bounded below by the
    /// highest stored row id so a torn counter write can never reuse an id
    fn restore_next_id(rows: &sled::Tree, store_meta: &sled::Tree, name: &str) -> Result<u64> {
        let persisted = store_meta
            .get(counter_key(name))
            .context("failed to read id counter")?
            .map(|v| {
                let bytes: [u8; 8] = v
                    .as_ref()
                    .try_into()
                    .context("corrupt id counter entry")?;
                Ok::<u64, anyhow::Error>(u64::from_be_bytes(bytes))
            })
            .transpose()?
            .unwrap_or(1);

        let last_row_id = rows
            .last()
            .context("failed to read row tree")?
            .map(|(k, _)| {
                let bytes: [u8; 8] = k.as_ref().try_into().context("corrupt row key")?;
                Ok::<u64, anyhow::Error>(u64::from_be_bytes(bytes))
            })
            .transpose()?
            .unwrap_or(0);

        Ok(persisted.max(last_row_id + 1).max(1))
    }

    /// Insert one row and return its generated id
    ///
    /// The row is flushed to disk before the id is returned, so the id is
    /// durable and visible to subsequent queries. A failed index add rolls
    /// the row back; the reserved id is consumed either way.
    pub fn insert(&self, content: &str, embedding: &[f64]) -> Result<u64> {
        if embedding.len() != self.meta.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.meta.dimension,
                actual: embedding.len(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        // Persist the counter before the row so a crash between the two
        // skips the id instead of reusing it
        self.store_meta
            .insert(
                counter_key(&self.meta.name),
                &self.next_id.load(Ordering::SeqCst).to_be_bytes(),
            )
            .context("failed to persist id counter")?;

        let stored = StoredEntry {
            content: content.to_string(),
            embedding: embedding.to_vec(),
        };
        let data = bincode::serialize(&stored)
            .with_context(|| format!("failed to serialize entry {id}"))?;
        self.rows
            .insert(id.to_be_bytes(), data)
            .with_context(|| format!("failed to store entry {id}"))?;

        let quantized: Vec<f32> = embedding.iter().map(|&x| x as f32).collect();
        if let Err(e) = self.index.add(id, &quantized) {
            let _ = self.rows.remove(id.to_be_bytes());
            return Err(Error::Backend(anyhow!(
                "failed to add entry {id} to similarity index: {e}"
            )));
        }

        self.rows.flush().context("failed to flush row tree")?;
        self.store_meta
            .flush()
            .context("failed to flush store metadata")?;

        debug!(collection = %self.meta.name, id, "inserted entry");
        Ok(id)
    }

    /// Retrieve the `top_k` nearest entries, closest first
    ///
    /// Raw distances come from the collection's index; they are mapped to
    /// scores with the requested metric's transform. Querying with a metric
    /// other than the one the index was built with is permitted but the
    /// ranking and scores are of undefined quality.
    pub fn query(&self, query: &[f64], top_k: usize, metric: Metric) -> Result<Vec<ScoredEntry>> {
        if query.len() != self.meta.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.meta.dimension,
                actual: query.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let quantized: Vec<f32> = query.iter().map(|&x| x as f32).collect();
        let matches = self
            .index
            .search(&quantized, top_k)
            .context("similarity search failed")?;

        let mut results = Vec::with_capacity(matches.keys.len());
        for (&key, &distance) in matches.keys.iter().zip(matches.distances.iter()) {
            let row = self
                .rows
                .get(key.to_be_bytes())
                .with_context(|| format!("failed to read entry {key}"))?
                .ok_or_else(|| anyhow!("indexed entry {key} has no stored row"))?;
            let stored: StoredEntry = bincode::deserialize(&row)
                .with_context(|| format!("failed to deserialize entry {key}"))?;
            results.push(ScoredEntry {
                id: key,
                content: stored.content,
                score: metric.score(f64::from(distance)),
            });
        }

        debug!(
            collection = %self.meta.name,
            requested = top_k,
            returned = results.len(),
            "query complete"
        );
        Ok(results)
    }

    /// Persist the similarity index to its on-disk file
    pub fn save_index(&self) -> Result<()> {
        let path_str = self
            .index_path
            .to_str()
            .ok_or_else(|| anyhow!("invalid index path: {}", self.index_path.display()))?;
        self.index
            .save(path_str)
            .with_context(|| format!("failed to save index for '{}'", self.meta.name))?;
        Ok(())
    }

    pub fn meta(&self) -> &CollectionMeta {
        &self.meta
    }

    /// Number of indexed entries
    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn counter_key(name: &str) -> Vec<u8> {
    format!("{name}:next_id").into_bytes()
}
