use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Vector length disagrees with the declared field layout: expected {expected}, got {actual}")]
    LayoutMismatch { expected: usize, actual: usize },

    #[error("A network needs an input and an output layer, got {0} layer sizes")]
    InvalidLayerSizes(usize),

    #[error("Diff shape does not match the network: expected layers {expected:?}, got {actual:?}")]
    DiffShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Store(#[from] predx_core::Error),
}
