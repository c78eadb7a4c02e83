//! # predx Core
//!
//! Core library for the predx text-completion engine.
//!
//! This crate provides the word-vector layer and the tokenizer:
//!
//! - [`Embedding`] - fixed-length word embedding with a squared-distance
//!   similarity score
//! - [`WordVector`] / [`SearchResult`] - stored entries and search hits
//! - [`VectorStore`] - exact, fuzzy and approximate nearest-neighbor search
//! - [`AnnForest`] - random-partition tree forest for approximate search
//! - [`TopK`] - online bounded top-K selection
//! - [`tokenize`] - longest-vocabulary-match tokenizer over a [`Lexicon`]
//!
//! ## Example
//!
//! ```rust
//! use predx_core::{Embedding, VectorStore, WordVector};
//!
//! let mut store = VectorStore::new(4);
//! store
//!     .add(WordVector::new("hello", Embedding::new(vec![0.1, 0.2, 0.3, 0.4])), true)
//!     .unwrap();
//!
//! let hit = store.exact("hello").unwrap();
//! assert_eq!(hit.embedding.dim(), 4);
//!
//! let close = store.fuzzy("helo", 5, 0.5, false);
//! assert_eq!(close[0].word.word, "hello");
//! ```

pub mod ann;
pub mod embedding;
pub mod error;
pub mod store;
pub mod token;
pub mod tokenizer;
pub mod topk;
pub mod word;

pub use ann::AnnForest;
pub use embedding::{Embedding, EMBEDDING_DIM};
pub use error::{Error, Result};
pub use store::VectorStore;
pub use token::{Token, TokenKind};
pub use tokenizer::{is_component_symbol, is_terminating_symbol, tokenize, Lexicon};
pub use topk::TopK;
pub use word::{SearchResult, WordVector};
