//! In-memory vehicle catalog: CSV load, one embedding per record, cosine
//! top-K queries. Built once at startup and read-only afterwards.

pub mod index;
pub mod record;

use thiserror::Error;

use crate::utils::error::ProviderError;

pub use index::{CatalogIndex, SearchHit};
pub use record::Vehicle;

/// The catalog source could not be read. Fatal at startup: a half-loaded
/// catalog is worse than none.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read catalog source: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed catalog row: {0}")]
    Malformed(#[from] csv::Error),

    #[error("row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
