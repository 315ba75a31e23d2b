//! Row removal for missing values.

use arrow::{
    array::{Array, BooleanArray, RecordBatch},
    compute::{filter_record_batch, kernels::boolean::and},
};

use super::Transform;
use crate::error::{Error, Result};

/// Drops every row that holds a null in one of the inspected columns.
///
/// With no columns given, every column is inspected.
///
/// # Example
///
/// ```
/// use pliegue::DropNulls;
///
/// let any = DropNulls::any();
/// let by_tail = DropNulls::columns(vec!["tail_number"]);
/// assert!(any.inspected().is_empty());
/// assert_eq!(by_tail.inspected(), ["tail_number"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DropNulls {
    columns: Vec<String>,
}

impl DropNulls {
    /// Inspects every column.
    pub fn any() -> Self {
        Self::default()
    }

    /// Inspects only the named columns.
    pub fn columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the inspected column names (empty means all columns).
    pub fn inspected(&self) -> &[String] {
        &self.columns
    }

    fn inspected_arrays<'a>(&self, batch: &'a RecordBatch) -> Result<Vec<&'a dyn Array>> {
        if self.columns.is_empty() {
            return Ok(batch.columns().iter().map(|a| &**a).collect());
        }

        self.columns
            .iter()
            .map(|name| {
                batch
                    .column_by_name(name)
                    .map(|a| &**a)
                    .ok_or_else(|| Error::column_not_found(name))
            })
            .collect()
    }
}

impl Transform for DropNulls {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let arrays = self.inspected_arrays(&batch)?;

        let mut keep: Option<BooleanArray> = None;
        for array in arrays.into_iter().filter(|a| a.null_count() > 0) {
            let valid = arrow::compute::is_not_null(array)?;
            keep = Some(match keep {
                Some(mask) => and(&mask, &valid)?,
                None => valid,
            });
        }

        match keep {
            Some(mask) => filter_record_batch(&batch, &mask).map_err(Error::Arrow),
            None => Ok(batch),
        }
    }
}
