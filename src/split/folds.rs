// Allow casts for index conversion - Arrow take indices are u32 and dataset
// sizes are bounded well below that
#![allow(clippy::cast_possible_truncation)]

//! Materializing folds of an Arrow dataset.

use std::sync::Arc;

use arrow::{
    array::{Array, RecordBatch, UInt32Array},
    compute::{concat_batches, take},
};
use serde::Serialize;

use super::{
    group_kfold::{FoldAssignment, GroupKFold, GroupKFoldSplits},
    groups::{group_keys, GroupKey},
};
use crate::{
    dataset::{ArrowDataset, Dataset},
    error::{Error, Result},
};

/// Train/test datasets of one fold.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    /// Fold index, used as the test set of this split
    pub fold: usize,
    /// Training dataset (all other folds)
    pub train: ArrowDataset,
    /// Test/holdout dataset
    pub test: ArrowDataset,
}

impl DatasetSplit {
    /// Fold index of this split.
    pub fn fold(&self) -> usize {
        self.fold
    }

    /// Get training data
    pub fn train(&self) -> &ArrowDataset {
        &self.train
    }

    /// Get test data
    pub fn test(&self) -> &ArrowDataset {
        &self.test
    }
}

impl GroupKFold {
    /// Split a dataset into folds using the labels in `group_column`.
    ///
    /// Train and test datasets keep the original row order. They are built
    /// one fold at a time as the returned iterator advances.
    ///
    /// # Example
    ///
    /// ```
    /// use pliegue::{ArrowDataset, Dataset, GroupKFold};
    ///
    /// let csv = "tail_number,arr_delay\nN1,3\nN1,-2\nN2,10\nN3,0\nN3,7\n";
    /// let flights = ArrowDataset::from_csv_str(csv).unwrap();
    ///
    /// for split in GroupKFold::new(3).split_dataset(&flights, "tail_number").unwrap() {
    ///     let split = split.unwrap();
    ///     assert_eq!(split.train().len() + split.test().len(), flights.len());
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Errors from [`group_keys`] and [`GroupKFold::assign`].
    pub fn split_dataset(&self, dataset: &ArrowDataset, group_column: &str) -> Result<DatasetFolds> {
        let keys = group_keys(dataset, group_column)?;
        let assignment = self.assign(&keys)?;
        let batch = concatenate_batches(dataset)?;

        Ok(DatasetFolds {
            batch,
            splits: assignment.splits().enumerate(),
        })
    }

    /// Summarize how the rows of `dataset` fall into folds, without
    /// materializing any fold.
    ///
    /// # Errors
    ///
    /// Errors from [`group_keys`] and [`GroupKFold::assign`].
    pub fn report(&self, dataset: &ArrowDataset, group_column: &str) -> Result<FoldReport> {
        let keys = group_keys(dataset, group_column)?;
        let assignment = self.assign(&keys)?;
        Ok(FoldReport::from_assignment(&assignment, &keys))
    }
}

/// Lazy iterator over the [`DatasetSplit`]s of a dataset.
#[derive(Debug, Clone)]
pub struct DatasetFolds {
    batch: RecordBatch,
    splits: std::iter::Enumerate<GroupKFoldSplits>,
}

impl Iterator for DatasetFolds {
    type Item = Result<DatasetSplit>;

    fn next(&mut self) -> Option<Self::Item> {
        let (fold, (train_idx, test_idx)) = self.splits.next()?;
        Some(build_split(&self.batch, fold, &train_idx, &test_idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.splits.size_hint()
    }
}

impl ExactSizeIterator for DatasetFolds {}

fn build_split(
    batch: &RecordBatch,
    fold: usize,
    train_idx: &[usize],
    test_idx: &[usize],
) -> Result<DatasetSplit> {
    Ok(DatasetSplit {
        fold,
        train: ArrowDataset::from_batch(take_indices(batch, train_idx)?)?,
        test: ArrowDataset::from_batch(take_indices(batch, test_idx)?)?,
    })
}

/// Concatenate all batches from a dataset into a single batch
fn concatenate_batches(dataset: &ArrowDataset) -> Result<RecordBatch> {
    match dataset.batches() {
        [] => Err(Error::EmptyDataset),
        [single] => Ok(single.clone()),
        batches => concat_batches(&dataset.schema(), batches).map_err(Error::Arrow),
    }
}

/// Take rows at given indices from a batch
fn take_indices(batch: &RecordBatch, indices: &[usize]) -> Result<RecordBatch> {
    let indices_array = UInt32Array::from_iter_values(indices.iter().map(|&i| i as u32));

    let columns: Vec<Arc<dyn Array>> = batch
        .columns()
        .iter()
        .map(|col| take(col.as_ref(), &indices_array, None).map_err(Error::Arrow))
        .collect::<Result<Vec<_>>>()?;

    RecordBatch::try_new(batch.schema(), columns).map_err(Error::Arrow)
}

/// Per-fold summary of a group k-fold assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldSummary {
    /// Fold index
    pub fold: usize,
    /// Rows in the training set
    pub train_rows: usize,
    /// Rows in the test set
    pub test_rows: usize,
    /// Distinct groups in the test set
    pub test_group_count: usize,
    /// Test groups, in order of first appearance
    pub test_groups: Vec<GroupKey>,
}

/// Summary of all folds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldReport {
    /// Number of folds
    pub n_splits: usize,
    /// Total rows
    pub total_rows: usize,
    /// Total distinct groups
    pub total_groups: usize,
    /// One entry per fold, ascending
    pub folds: Vec<FoldSummary>,
}

impl FoldReport {
    /// Build a report from an assignment and the labels it was computed from.
    pub fn from_assignment(assignment: &FoldAssignment, keys: &[GroupKey]) -> Self {
        let total_rows = assignment.n_rows();
        let mut folds: Vec<FoldSummary> = (0..assignment.n_splits())
            .map(|fold| FoldSummary {
                fold,
                train_rows: total_rows - assignment.fold_rows()[fold],
                test_rows: assignment.fold_rows()[fold],
                test_group_count: assignment.fold_groups()[fold],
                test_groups: Vec::new(),
            })
            .collect();

        for (&fold, &first_row) in assignment
            .group_folds()
            .iter()
            .zip(assignment.group_first_rows())
        {
            if let Some(key) = keys.get(first_row) {
                folds[fold].test_groups.push(key.clone());
            }
        }

        Self {
            n_splits: assignment.n_splits(),
            total_rows,
            total_groups: assignment.n_groups(),
            folds,
        }
    }

    /// Largest difference in test rows between any two folds.
    pub fn row_spread(&self) -> usize {
        let rows = self.folds.iter().map(|f| f.test_rows);
        let max = rows.clone().max().unwrap_or(0);
        let min = rows.min().unwrap_or(0);
        max - min
    }
}
