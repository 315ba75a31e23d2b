//! pliegue - Group-aware k-fold cross-validation for Arrow datasets
//!
//! Splits tabular data into cross-validation folds such that every row
//! sharing a group label lands in the same fold. Typical use: keep all
//! flights of one aircraft (tail number) on the same side of every
//! train/test split.
//!
//! # Quick Start
//!
//! ```no_run
//! use pliegue::{ArrowDataset, Dataset, DropNulls, GroupKFold};
//!
//! let flights = ArrowDataset::from_csv("flights.csv")
//!     .unwrap()
//!     .with_transform(&DropNulls::any())
//!     .unwrap();
//!
//! for split in GroupKFold::new(5).split_dataset(&flights, "tail_number").unwrap() {
//!     let split = split.unwrap();
//!     println!("fold {}: {} train / {} test", split.fold(), split.train().len(), split.test().len());
//! }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::too_many_lines,
        clippy::similar_names
    )
)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

/// CLI module for command-line interface
#[cfg(feature = "cli")]
pub mod cli;
pub mod dataset;
pub mod error;
pub mod split;
pub mod transform;

pub use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
};
pub use dataset::{ArrowDataset, CsvOptions, Dataset};
pub use error::{Error, Result};
pub use split::{
    group_keys, DatasetFolds, DatasetSplit, FoldAssignment, FoldReport, FoldSummary, GroupKFold,
    GroupKFoldSplits, GroupKey,
};
pub use transform::{Chain, Drop, DropNulls, Rename, Select, Transform};
