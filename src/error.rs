//! Library-root error taxonomy.
//!
//! One small error enum per module, composed here with `#[from]` rather
//! than collapsing everything into a single monolithic error type.

use crate::bundle::BundleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Bundle(#[from] BundleError),
}
