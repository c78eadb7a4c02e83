//! # predx Engine
//!
//! The completion engine: a feed-forward network primitive trained by
//! diff-based local search, the three-network orchestration pipeline, and
//! the concurrent perturbation trainer.
//!
//! - [`NeuralNet`] / [`NetDiff`] - compute primitive and its additive
//!   perturbations, with the explicit training state machine
//!   ([`TrainTransition`])
//! - [`PredictorLayout`] and friends - validated field-size contracts for
//!   every network input/output
//! - [`Completer`] - recurrent state, word resolution with improvisation,
//!   next-token prediction, context accumulation, sub-store partitioning
//! - [`trainer`] - cost function and the eight-way concurrent
//!   perturbation step
//!
//! ## Example
//!
//! ```rust,no_run
//! use predx_core::{VectorStore, WordVector, Embedding};
//! use predx_engine::{trainer, Completer, CostWeights, SectionStats};
//!
//! let mut store = VectorStore::new(32);
//! let mut rng = rand::rng();
//! store.add_random("hello", &mut rng).unwrap();
//!
//! let mut completer = Completer::new(store, 64, 64).unwrap();
//! completer.partition_into_subdatabases().unwrap();
//!
//! let text = "hello there.";
//! let tokens = completer.tokenize(text);
//! let stats = SectionStats::from_section(text, &tokens);
//! let prediction = completer.predict_next_token(&tokens[0], &stats).unwrap();
//! ```

pub mod completer;
pub mod diff;
pub mod error;
pub mod layout;
pub mod net;
pub mod stats;
pub mod trainer;

pub use completer::{
    Completer, Prediction, SearchedWordVector, StoreCatalog, SubStores, FUZZY_LADDER_TOP_N,
};
pub use diff::NetDiff;
pub use error::{Error, Result};
pub use layout::{
    ContextInput, ContextLayout, ContextOutput, ImproviserInput, ImproviserLayout,
    ImproviserOutput, PredictorInput, PredictorLayout, PredictorOutput,
};
pub use net::{NeuralNet, TrainTransition, GOOD_COST};
pub use stats::{
    flesch_kincaid_grade, sentence_count, sentence_length_mean, sentence_length_stddev,
    SectionStats,
};
pub use trainer::{CostWeights, TrainingModification, DIFF_SCALE};
