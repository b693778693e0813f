// store

mod document_store;

pub use document_store::*;

// tx

mod repo_tx;

pub use repo_tx::*;
