//! Group-aware k-fold assignment.
//!
//! Every distinct group is assigned to exactly one fold, so rows sharing a
//! group never straddle the train/test boundary of any split. Groups are
//! placed greedily, heaviest first, onto the fold holding the fewest rows.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of folds.
pub const DEFAULT_N_SPLITS: usize = 5;

fn default_n_splits() -> usize {
    DEFAULT_N_SPLITS
}

/// K-fold cross-validator with non-overlapping groups.
///
/// The same group never appears in two different folds, and each fold is
/// used once as the test set while the remaining folds form the training
/// set. Splitting is deterministic: there is no shuffling.
///
/// # Example
///
/// ```
/// use pliegue::GroupKFold;
///
/// let tails = ["N1", "N1", "N2", "N2", "N3", "N3", "N4"];
/// let kfold = GroupKFold::new(2);
///
/// let splits: Vec<_> = kfold.split(&tails).unwrap().collect();
/// assert_eq!(splits[0], (vec![2, 3, 6], vec![0, 1, 4, 5]));
/// assert_eq!(splits[1], (vec![0, 1, 4, 5], vec![2, 3, 6]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKFold {
    #[serde(default = "default_n_splits")]
    n_splits: usize,
}

impl Default for GroupKFold {
    fn default() -> Self {
        Self::new(DEFAULT_N_SPLITS)
    }
}

impl GroupKFold {
    /// Create a new group k-fold splitter.
    ///
    /// `n_splits` must be at least 2; this is checked when splitting.
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// Number of folds.
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Assign every row's group to a fold.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `n_splits < 2` or `groups` is empty
    /// - [`Error::InsufficientGroups`] if there are fewer distinct groups
    ///   than folds
    pub fn assign<G>(&self, groups: &[G]) -> Result<FoldAssignment>
    where
        G: Eq + Hash,
    {
        if self.n_splits < 2 {
            return Err(Error::invalid_config(format!(
                "n_splits must be at least 2, got {}",
                self.n_splits
            )));
        }
        if groups.is_empty() {
            return Err(Error::invalid_config(
                "Group labels are required and must not be empty",
            ));
        }

        // Distinct groups in order of first appearance, with row weights.
        let mut group_ids: HashMap<&G, usize> = HashMap::new();
        let mut row_groups = Vec::with_capacity(groups.len());
        let mut weights: Vec<usize> = Vec::new();
        let mut first_rows: Vec<usize> = Vec::new();
        for (row, label) in groups.iter().enumerate() {
            let next_id = weights.len();
            let id = *group_ids.entry(label).or_insert(next_id);
            if id == next_id {
                weights.push(0);
                first_rows.push(row);
            }
            weights[id] += 1;
            row_groups.push(id);
        }

        let n_groups = weights.len();
        if n_groups < self.n_splits {
            return Err(Error::insufficient_groups(n_groups, self.n_splits));
        }

        // Heaviest first; equal weights keep first-appearance order.
        let mut order: Vec<usize> = (0..n_groups).collect();
        order.sort_by(|&a, &b| weights[b].cmp(&weights[a]).then(a.cmp(&b)));

        let mut fold_rows = vec![0usize; self.n_splits];
        let mut fold_groups = vec![0usize; self.n_splits];
        let mut group_fold = vec![0usize; n_groups];
        for &group in &order {
            let fold = lightest_fold(&fold_rows);
            group_fold[group] = fold;
            fold_rows[fold] += weights[group];
            fold_groups[fold] += 1;
            trace!(
                "group #{group} ({} rows) -> fold {fold}",
                weights[group]
            );
        }

        debug!(
            "assigned {n_groups} groups over {} rows to {} folds, rows per fold: {fold_rows:?}",
            groups.len(),
            self.n_splits
        );

        let row_folds = row_groups.iter().map(|&g| group_fold[g]).collect();

        Ok(FoldAssignment {
            n_splits: self.n_splits,
            row_folds: Arc::new(row_folds),
            row_groups,
            group_fold,
            first_rows,
            fold_rows,
            fold_groups,
        })
    }

    /// Generate `(train_indices, test_indices)` for each fold.
    ///
    /// The returned iterator is lazy: the indices of a fold are only
    /// materialized when that fold is reached. Both index lists are sorted
    /// ascending.
    ///
    /// # Errors
    ///
    /// See [`GroupKFold::assign`].
    pub fn split<G>(&self, groups: &[G]) -> Result<GroupKFoldSplits>
    where
        G: Eq + Hash,
    {
        Ok(self.assign(groups)?.splits())
    }
}

/// Index of the fold with the fewest rows; ties go to the lowest index.
fn lightest_fold(fold_rows: &[usize]) -> usize {
    fold_rows
        .iter()
        .enumerate()
        .min_by_key(|&(fold, &rows)| (rows, fold))
        .map_or(0, |(fold, _)| fold)
}

/// The outcome of assigning groups to folds.
#[derive(Debug, Clone)]
pub struct FoldAssignment {
    n_splits: usize,
    row_folds: Arc<Vec<usize>>,
    row_groups: Vec<usize>,
    group_fold: Vec<usize>,
    first_rows: Vec<usize>,
    fold_rows: Vec<usize>,
    fold_groups: Vec<usize>,
}

impl FoldAssignment {
    /// Number of folds.
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Number of rows that were assigned.
    pub fn n_rows(&self) -> usize {
        self.row_folds.len()
    }

    /// Number of distinct groups.
    pub fn n_groups(&self) -> usize {
        self.group_fold.len()
    }

    /// Fold of every row, indexed by row.
    pub fn row_folds(&self) -> &[usize] {
        &self.row_folds
    }

    /// Fold of a single row.
    pub fn fold_of_row(&self, row: usize) -> Option<usize> {
        self.row_folds.get(row).copied()
    }

    /// Distinct group number of every row. Groups are numbered by first
    /// appearance, starting at 0.
    pub fn row_groups(&self) -> &[usize] {
        &self.row_groups
    }

    /// Fold of every distinct group, indexed by group number.
    pub fn group_folds(&self) -> &[usize] {
        &self.group_fold
    }

    /// Row at which each distinct group first appears.
    pub fn group_first_rows(&self) -> &[usize] {
        &self.first_rows
    }

    /// Rows held by each fold's test set.
    pub fn fold_rows(&self) -> &[usize] {
        &self.fold_rows
    }

    /// Distinct groups held by each fold's test set.
    pub fn fold_groups(&self) -> &[usize] {
        &self.fold_groups
    }

    /// Test row indices of one fold, ascending.
    pub fn test_indices(&self, fold: usize) -> Vec<usize> {
        indices_where(&self.row_folds, |f| f == fold)
    }

    /// Train row indices of one fold, ascending.
    pub fn train_indices(&self, fold: usize) -> Vec<usize> {
        indices_where(&self.row_folds, |f| f != fold)
    }

    /// Lazy `(train, test)` iterator over all folds.
    pub fn splits(&self) -> GroupKFoldSplits {
        GroupKFoldSplits {
            row_folds: Arc::clone(&self.row_folds),
            n_splits: self.n_splits,
            next_fold: 0,
        }
    }
}

fn indices_where(row_folds: &[usize], keep: impl Fn(usize) -> bool) -> Vec<usize> {
    row_folds
        .iter()
        .enumerate()
        .filter(|&(_, &fold)| keep(fold))
        .map(|(row, _)| row)
        .collect()
}

/// Iterator over `(train_indices, test_indices)` pairs, one per fold.
///
/// Cloning the iterator restarts it from the current position; a fresh
/// iterator from [`FoldAssignment::splits`] always starts at fold 0.
#[derive(Debug, Clone)]
pub struct GroupKFoldSplits {
    row_folds: Arc<Vec<usize>>,
    n_splits: usize,
    next_fold: usize,
}

impl Iterator for GroupKFoldSplits {
    type Item = (Vec<usize>, Vec<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_fold >= self.n_splits {
            return None;
        }
        let fold = self.next_fold;
        self.next_fold += 1;

        let (test, train): (Vec<usize>, Vec<usize>) =
            (0..self.row_folds.len()).partition(|&row| self.row_folds[row] == fold);
        Some((train, test))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.n_splits - self.next_fold;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GroupKFoldSplits {}
