//! Group-aware k-fold cross-validation splitting.
//!
//! Rows that share a group label (an aircraft tail number, a patient id)
//! must never be split between training and test data. [`GroupKFold`]
//! assigns whole groups to folds and yields one train/test split per fold.
//!
//! # Example
//!
//! ```
//! use pliegue::split::GroupKFold;
//!
//! let tails = ["N1", "N2", "N3"];
//! for (train, test) in GroupKFold::new(3).split(&tails).unwrap() {
//!     assert_eq!(train.len(), 2);
//!     assert_eq!(test.len(), 1);
//! }
//! ```

mod folds;
mod group_kfold;
mod groups;

pub use folds::{DatasetFolds, DatasetSplit, FoldReport, FoldSummary};
pub use group_kfold::{FoldAssignment, GroupKFold, GroupKFoldSplits, DEFAULT_N_SPLITS};
pub use groups::{group_keys, GroupKey};
