//! Column selection and renaming transforms.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use arrow::{
    array::RecordBatch,
    datatypes::{Field, Schema},
};

use super::Transform;
use crate::error::{Error, Result};

/// Keeps only the named columns, in the given order.
#[derive(Debug, Clone)]
pub struct Select {
    columns: Vec<String>,
}

impl Select {
    /// Creates a new Select transform for the given column names.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the columns to be selected.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Transform for Select {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let schema = batch.schema();
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut arrays = Vec::with_capacity(self.columns.len());

        for col_name in &self.columns {
            let (idx, field) = schema
                .column_with_name(col_name)
                .ok_or_else(|| Error::column_not_found(col_name))?;

            fields.push(field.clone());
            arrays.push(Arc::clone(batch.column(idx)));
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(Error::Arrow)
    }
}

/// Renames columns.
///
/// Every source name in the mapping must exist in the batch, so a typo in a
/// column name surfaces as [`Error::ColumnNotFound`] instead of silently
/// leaving the column untouched.
#[derive(Debug, Clone)]
pub struct Rename {
    mapping: HashMap<String, String>,
}

impl Rename {
    /// Creates a new Rename transform with the given column mappings.
    pub fn new(mapping: HashMap<String, String>) -> Self {
        Self { mapping }
    }

    /// Creates a Rename transform from pairs of (old_name, new_name).
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, S)>) -> Self {
        let mapping = pairs
            .into_iter()
            .map(|(old, new)| (old.into(), new.into()))
            .collect();
        Self { mapping }
    }
}

impl Transform for Rename {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let schema = batch.schema();

        if let Some(missing) = self
            .mapping
            .keys()
            .find(|old| schema.column_with_name(old).is_none())
        {
            return Err(Error::column_not_found(missing));
        }

        let new_fields: Vec<Field> = schema
            .fields()
            .iter()
            .map(|field| match self.mapping.get(field.name()) {
                Some(new_name) => field.as_ref().clone().with_name(new_name),
                None => field.as_ref().clone(),
            })
            .collect();

        let mut seen = HashSet::with_capacity(new_fields.len());
        if let Some(duplicate) = new_fields.iter().find(|field| !seen.insert(field.name())) {
            return Err(Error::transform(format!(
                "Rename would produce duplicate column '{}'",
                duplicate.name()
            )));
        }

        let new_schema = Arc::new(Schema::new_with_metadata(
            new_fields,
            schema.metadata().clone(),
        ));
        RecordBatch::try_new(new_schema, batch.columns().to_vec()).map_err(Error::Arrow)
    }
}

/// Removes the named columns. Names that are absent are ignored.
#[derive(Debug, Clone)]
pub struct Drop {
    columns: Vec<String>,
}

impl Drop {
    /// Creates a new Drop transform for the given column names.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the columns to be dropped.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Transform for Drop {
    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let schema = batch.schema();
        let drop_set: HashSet<&str> = self.columns.iter().map(String::as_str).collect();

        let (fields, arrays): (Vec<Field>, Vec<_>) = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .filter(|(field, _)| !drop_set.contains(field.name().as_str()))
            .map(|(field, array)| (field.as_ref().clone(), Arc::clone(array)))
            .unzip();

        if fields.is_empty() {
            return Err(Error::transform("Cannot drop all columns from batch"));
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(Error::Arrow)
    }
}
