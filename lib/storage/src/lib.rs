//! # predx Storage
//!
//! Binary persistence for the predx engine: single-file bincode snapshots
//! of stores, networks and whole completers, written through atomic file
//! replacement. Missing or corrupt files surface as errors to the caller;
//! nothing is recovered locally.

pub mod error;
pub mod snapshot;

pub use error::{Error, Result};
pub use snapshot::{
    load_completer, load_net, load_store, save_completer, save_net, save_store, CompleterSnapshot,
    StoreSnapshot, WordEntry,
};
