mod document_store_mysql;

pub use document_store_mysql::*;

mod repo_tx_mysql;

pub use repo_tx_mysql::*;
