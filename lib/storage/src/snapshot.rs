use crate::error::{Error, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use predx_core::{AnnForest, Embedding, VectorStore, WordVector};
use predx_engine::{Completer, NeuralNet};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// On-disk form of a word-vector store: the word list plus the opaque
/// forest blob. An empty blob means the forest was never built (or was
/// stale at save time) and the loaded store reports "not built".
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub dim: usize,
    pub words: Vec<WordEntry>,
    pub ann_blob: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub embedding: Vec<f32>,
}

impl StoreSnapshot {
    pub fn capture(store: &VectorStore) -> Result<Self> {
        let ann_blob = match store.ann_forest() {
            Some(forest) if store.is_ann_built() => {
                bincode::serialize(forest).map_err(|e| Error::Encode(e.to_string()))?
            }
            _ => Vec::new(),
        };

        let words = store
            .entries()
            .iter()
            .map(|entry| WordEntry {
                word: entry.word.clone(),
                embedding: entry.embedding.as_slice().to_vec(),
            })
            .collect();

        Ok(Self {
            dim: store.dim(),
            words,
            ann_blob,
        })
    }

    /// Rebuild the store. The exact-match index is reconstructed from the
    /// word list, never read out of the blob.
    pub fn restore(self) -> Result<VectorStore> {
        let forest: Option<AnnForest> = if self.ann_blob.is_empty() {
            None
        } else {
            Some(bincode::deserialize(&self.ann_blob).map_err(|e| Error::Decode(e.to_string()))?)
        };

        let words = self
            .words
            .into_iter()
            .map(|entry| WordVector::new(entry.word, Embedding::new(entry.embedding)))
            .collect();

        Ok(VectorStore::from_parts(self.dim, words, forest)?)
    }
}

/// On-disk form of a completer: recurrent memories, the three networks and
/// the store snapshot. Sub-stores are not persisted; they are rebuilt by
/// partitioning on load.
#[derive(Serialize, Deserialize)]
pub struct CompleterSnapshot {
    pub ephemeral_memory: Vec<f32>,
    pub context_memory: Vec<f32>,
    pub predictor: NeuralNet,
    pub context_builder: NeuralNet,
    pub improviser: NeuralNet,
    pub store: StoreSnapshot,
}

impl CompleterSnapshot {
    pub fn capture(completer: &Completer) -> Result<Self> {
        let catalog = completer.catalog().read();
        Ok(Self {
            ephemeral_memory: completer.ephemeral_memory().to_vec(),
            context_memory: completer.context_memory().to_vec(),
            predictor: completer.predictor().clone(),
            context_builder: completer.context_builder().clone(),
            improviser: completer.improviser().clone(),
            store: StoreSnapshot::capture(&catalog.main)?,
        })
    }

    pub fn restore(self) -> Result<Completer> {
        let store = self.store.restore()?;
        let mut completer = Completer::new(
            store,
            self.ephemeral_memory.len(),
            self.context_memory.len(),
        )?;

        completer.set_predictor_net(self.predictor)?;
        completer.set_context_builder_net(self.context_builder)?;
        completer.set_improviser_net(self.improviser)?;
        completer.set_memories(self.ephemeral_memory, self.context_memory)?;
        completer.partition_into_subdatabases()?;

        Ok(completer)
    }
}

pub fn save_store(store: &VectorStore, path: impl AsRef<Path>) -> Result<()> {
    let snapshot = StoreSnapshot::capture(store)?;
    let bytes = bincode::serialize(&snapshot).map_err(|e| Error::Encode(e.to_string()))?;
    write_atomic(path.as_ref(), &bytes)
}

pub fn load_store(path: impl AsRef<Path>) -> Result<VectorStore> {
    let bytes = std::fs::read(path.as_ref())?;
    let snapshot: StoreSnapshot =
        bincode::deserialize(&bytes).map_err(|e| Error::Decode(e.to_string()))?;
    snapshot.restore()
}

pub fn save_net(net: &NeuralNet, path: impl AsRef<Path>) -> Result<()> {
    let bytes = bincode::serialize(net).map_err(|e| Error::Encode(e.to_string()))?;
    write_atomic(path.as_ref(), &bytes)
}

pub fn load_net(path: impl AsRef<Path>) -> Result<NeuralNet> {
    let bytes = std::fs::read(path.as_ref())?;
    bincode::deserialize(&bytes).map_err(|e| Error::Decode(e.to_string()))
}

pub fn save_completer(completer: &Completer, path: impl AsRef<Path>) -> Result<()> {
    let snapshot = CompleterSnapshot::capture(completer)?;
    let bytes = bincode::serialize(&snapshot).map_err(|e| Error::Encode(e.to_string()))?;
    write_atomic(path.as_ref(), &bytes)
}

pub fn load_completer(path: impl AsRef<Path>) -> Result<Completer> {
    let bytes = std::fs::read(path.as_ref())?;
    let snapshot: CompleterSnapshot =
        bincode::deserialize(&bytes).map_err(|e| Error::Decode(e.to_string()))?;
    snapshot.restore()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = AtomicFile::new(path, OverwriteBehavior::AllowOverwrite);
    file.write(|f| f.write_all(bytes)).map_err(|e| match e {
        atomicwrites::Error::Internal(err) | atomicwrites::Error::User(err) => Error::Io(err),
    })
}
