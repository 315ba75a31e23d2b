//! Group labels read from a dataset column.

use std::fmt;

use arrow::{
    array::{Array, ArrayRef, AsArray},
    datatypes::{
        DataType, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type, UInt64Type,
        UInt8Type,
    },
};
use serde::Serialize;

use crate::{
    dataset::{ArrowDataset, Dataset},
    error::{Error, Result},
};

/// An owned group identifier taken from one cell of a group column.
///
/// Only equality matters for grouping; ordering exists so reports can list
/// groups deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    /// Signed integer label.
    Int(i64),
    /// Unsigned integer label.
    UInt(u64),
    /// String label, e.g. an aircraft tail number.
    Str(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

/// Read the group label of every row of `dataset` from `column`.
///
/// Labels are returned in global row order across batches.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if the column does not exist or has a type
///   that cannot act as a group label
/// - [`Error::Data`] if any label is null
pub fn group_keys(dataset: &ArrowDataset, column: &str) -> Result<Vec<GroupKey>> {
    let schema = dataset.schema();
    let idx = schema
        .index_of(column)
        .map_err(|_| Error::invalid_config(format!("Group column '{column}' not found")))?;

    let mut keys = Vec::with_capacity(dataset.len());
    for batch in dataset.batches() {
        let offset = keys.len();
        append_keys(batch.column(idx), offset, column, &mut keys)?;
    }
    Ok(keys)
}

fn append_keys(
    array: &ArrayRef,
    offset: usize,
    column: &str,
    keys: &mut Vec<GroupKey>,
) -> Result<()> {
    if let Some(null_at) = (0..array.len()).find(|&i| array.is_null(i)) {
        return Err(Error::data(format!(
            "Null group label in column '{column}' at row {}",
            offset + null_at
        )));
    }

    macro_rules! signed {
        ($t:ty) => {
            keys.extend(
                array
                    .as_primitive::<$t>()
                    .values()
                    .iter()
                    .map(|&v| GroupKey::Int(i64::from(v))),
            )
        };
    }
    macro_rules! unsigned {
        ($t:ty) => {
            keys.extend(
                array
                    .as_primitive::<$t>()
                    .values()
                    .iter()
                    .map(|&v| GroupKey::UInt(u64::from(v))),
            )
        };
    }

    match array.data_type() {
        DataType::Int8 => signed!(Int8Type),
        DataType::Int16 => signed!(Int16Type),
        DataType::Int32 => signed!(Int32Type),
        DataType::Int64 => signed!(Int64Type),
        DataType::UInt8 => unsigned!(UInt8Type),
        DataType::UInt16 => unsigned!(UInt16Type),
        DataType::UInt32 => unsigned!(UInt32Type),
        DataType::UInt64 => unsigned!(UInt64Type),
        DataType::Utf8 => keys.extend(
            array
                .as_string::<i32>()
                .iter()
                .flatten()
                .map(|v| GroupKey::Str(v.to_string())),
        ),
        DataType::LargeUtf8 => keys.extend(
            array
                .as_string::<i64>()
                .iter()
                .flatten()
                .map(|v| GroupKey::Str(v.to_string())),
        ),
        dt => {
            return Err(Error::invalid_config(format!(
                "Unsupported group column type for '{column}': {dt:?}"
            )))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::{
        array::{Float64Array, Int64Array, LargeStringArray, RecordBatch, StringArray, UInt16Array},
        datatypes::{Field, Schema},
    };

    use super::*;

    fn single_column(name: &str, array: ArrayRef) -> ArrowDataset {
        let schema = Arc::new(Schema::new(vec![Field::new(
            name,
            array.data_type().clone(),
            true,
        )]));
        let batch = RecordBatch::try_new(schema, vec![array]).expect("batch");
        ArrowDataset::from_batch(batch).expect("dataset")
    }

    #[test]
    fn test_string_keys_across_batches() {
        let schema = Arc::new(Schema::new(vec![Field::new("tail", DataType::Utf8, false)]));
        let first = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["N1", "N2"]))],
        )
        .expect("batch");
        let second =
            RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["N1"]))])
                .expect("batch");
        let dataset = ArrowDataset::new(vec![first, second]).expect("dataset");

        let keys = group_keys(&dataset, "tail").expect("keys");
        assert_eq!(
            keys,
            vec![
                GroupKey::Str("N1".into()),
                GroupKey::Str("N2".into()),
                GroupKey::Str("N1".into()),
            ]
        );
    }

    #[test]
    fn test_integer_keys() {
        let dataset = single_column("carrier_id", Arc::new(Int64Array::from(vec![-3, 19, -3])));
        let keys = group_keys(&dataset, "carrier_id").expect("keys");
        assert_eq!(keys[0], GroupKey::Int(-3));
        assert_eq!(keys[0], keys[2]);

        let dataset = single_column("gate", Arc::new(UInt16Array::from(vec![4, 4])));
        let keys = group_keys(&dataset, "gate").expect("keys");
        assert_eq!(keys, vec![GroupKey::UInt(4), GroupKey::UInt(4)]);
    }

    #[test]
    fn test_large_string_keys() {
        let dataset = single_column("tail", Arc::new(LargeStringArray::from(vec!["N9"])));
        let keys = group_keys(&dataset, "tail").expect("keys");
        assert_eq!(keys, vec![GroupKey::Str("N9".into())]);
    }

    #[test]
    fn test_missing_column_is_config_error() {
        let dataset = single_column("tail", Arc::new(StringArray::from(vec!["N1"])));
        let result = group_keys(&dataset, "tail_number");
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_null_label_is_data_error() {
        let dataset = single_column(
            "tail",
            Arc::new(StringArray::from(vec![Some("N1"), None, Some("N2")])),
        );
        match group_keys(&dataset, "tail") {
            Err(Error::Data { message }) => assert!(message.contains("row 1")),
            other => panic!("expected data error, got {other:?}"),
        }
    }

    #[test]
    fn test_float_column_rejected() {
        let dataset = single_column("delay", Arc::new(Float64Array::from(vec![1.5])));
        let result = group_keys(&dataset, "delay");
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_display() {
        assert_eq!(GroupKey::Str("N123AA".into()).to_string(), "N123AA");
        assert_eq!(GroupKey::Int(-4).to_string(), "-4");
        assert_eq!(GroupKey::UInt(12).to_string(), "12");
    }
}
