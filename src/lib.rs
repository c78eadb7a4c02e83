//! # predx
//!
//! An experimental text-completion engine built on a learned word-embedding
//! store and a small chain of feed-forward networks. Given a stream of
//! tokens it maintains recurrent state and predicts, for each token, a
//! next-word embedding, resolved back to an actual word by nearest-neighbor
//! lookup against the store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use predx::prelude::*;
//!
//! // Seed a store with random embeddings.
//! let mut store = VectorStore::new(EMBEDDING_DIM);
//! let mut rng = rand::rng();
//! for word in ["the", "quick", "brown", "fox"] {
//!     store.add_random(word, &mut rng).unwrap();
//! }
//!
//! // Wire up a completer and predict.
//! let mut completer = Completer::new(store, 64, 64).unwrap();
//! completer.partition_into_subdatabases().unwrap();
//!
//! let text = "the quick fox.";
//! let tokens = completer.tokenize(text);
//! let stats = SectionStats::from_section(text, &tokens);
//! for token in &tokens {
//!     let prediction = completer.predict_next_token(token, &stats).unwrap();
//!     println!("{} -> {:?}", token, prediction.kind_scores);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`predx-core`](https://docs.rs/predx-core) - embeddings, the
//!   word-vector store with exact/fuzzy/approximate search, the tokenizer
//! - [`predx-engine`](https://docs.rs/predx-engine) - networks, the
//!   completion pipeline, the perturbation trainer
//! - [`predx-storage`](https://docs.rs/predx-storage) - binary snapshot
//!   persistence

// Re-export core types
pub use predx_core::{
    tokenize, AnnForest, Embedding, Lexicon, SearchResult, Token, TokenKind, TopK, VectorStore,
    WordVector, EMBEDDING_DIM,
};

// Re-export the engine
pub use predx_engine::{
    trainer, Completer, CostWeights, NetDiff, NeuralNet, Prediction, SearchedWordVector,
    SectionStats, TrainTransition, TrainingModification,
};

// Re-export storage
pub use predx_storage::{
    load_completer, load_net, load_store, save_completer, save_net, save_store,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_completer, load_store, save_completer, save_store, tokenize, Completer, CostWeights,
        Embedding, Lexicon, NeuralNet, Prediction, SearchResult, SectionStats, Token, TokenKind,
        VectorStore, WordVector, EMBEDDING_DIM,
    };
    pub use predx_engine::trainer;
}
