//! Data transforms for pliegue.
//!
//! Transforms clean a dataset before it is split: selecting, renaming and
//! dropping columns, and dropping rows with missing values. All transforms
//! are composable through [`Chain`].

use std::sync::Arc;

use arrow::array::RecordBatch;

use crate::error::Result;

mod nulls;
mod selection;

pub use nulls::DropNulls;
pub use selection::{Drop, Rename, Select};

/// A transform that can be applied to RecordBatches.
///
/// # Thread Safety
///
/// All transforms must be thread-safe (Send + Sync).
pub trait Transform: Send + Sync {
    /// Applies the transform to a RecordBatch.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform cannot be applied to the batch.
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch>;
}

/// A chain of transforms applied in sequence.
///
/// # Example
///
/// ```
/// use pliegue::{Chain, DropNulls, Rename};
///
/// let clean = Chain::new()
///     .then(DropNulls::any())
///     .then(Rename::from_pairs([("Tail_Number", "tail_number")]));
/// assert_eq!(clean.len(), 2);
/// ```
pub struct Chain {
    transforms: Vec<Box<dyn Transform>>,
}

impl Chain {
    /// Creates a new empty transform chain.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Adds a transform to the chain.
    #[must_use]
    pub fn then<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Returns the number of transforms in the chain.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns true if the chain has no transforms.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Chain {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        self.transforms
            .iter()
            .try_fold(batch, |acc, transform| transform.apply(acc))
    }
}

impl Transform for Box<dyn Transform> {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        (**self).apply(batch)
    }
}

impl Transform for Arc<dyn Transform> {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        (**self).apply(batch)
    }
}
