//! Dataset types for pliegue.
//!
//! Provides the [`Dataset`] trait and [`ArrowDataset`] implementation
//! for holding the tabular data that gets split into folds.

use std::{path::Path, sync::Arc};

use arrow::{
    array::RecordBatch,
    datatypes::{DataType, Field, Schema, SchemaRef},
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    file::properties::WriterProperties,
};

use crate::{
    error::{Error, Result},
    transform::Transform,
};

/// Number of rows sampled when inferring a CSV schema.
const SCHEMA_INFER_ROWS: usize = 1000;

/// A dataset that can be iterated over.
///
/// Datasets expose tabular data stored as Arrow RecordBatches. Row indices
/// are global: row `i` is the `i`-th row across all batches in order.
pub trait Dataset: Send + Sync {
    /// Returns the total number of rows in the dataset.
    fn len(&self) -> usize;

    /// Returns true if the dataset contains no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the schema of the dataset.
    fn schema(&self) -> SchemaRef;

    /// Returns an iterator over all RecordBatches in the dataset.
    fn iter(&self) -> Box<dyn Iterator<Item = RecordBatch> + Send + '_>;

    /// Returns the number of batches in the dataset.
    fn num_batches(&self) -> usize;

    /// Returns a specific batch by index.
    fn get_batch(&self, index: usize) -> Option<&RecordBatch>;
}

/// An in-memory dataset backed by Arrow RecordBatches.
///
/// # Example
///
/// ```no_run
/// use pliegue::{ArrowDataset, Dataset};
///
/// let flights = ArrowDataset::from_csv("flights.csv").unwrap();
/// println!("{} flights loaded", flights.len());
/// ```
#[derive(Debug, Clone)]
pub struct ArrowDataset {
    batches: Vec<RecordBatch>,
    schema: SchemaRef,
    row_count: usize,
}

impl ArrowDataset {
    /// Creates a new ArrowDataset from a vector of RecordBatches.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The batches vector is empty
    /// - The batches have inconsistent schemas
    pub fn new(batches: Vec<RecordBatch>) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Err(Error::EmptyDataset);
        };
        let schema = first.schema();

        for (i, batch) in batches.iter().enumerate().skip(1) {
            if batch.schema() != schema {
                return Err(Error::schema_mismatch(format!(
                    "Batch {} has different schema than batch 0",
                    i
                )));
            }
        }

        let row_count = batches.iter().map(RecordBatch::num_rows).sum();

        Ok(Self {
            batches,
            schema,
            row_count,
        })
    }

    /// Creates an ArrowDataset from a single RecordBatch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot form a dataset.
    pub fn from_batch(batch: RecordBatch) -> Result<Self> {
        Self::new(vec![batch])
    }

    /// Loads a dataset from a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not valid Parquet,
    /// or contains no batches.
    pub fn from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;

        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let batches: Vec<RecordBatch> = reader.collect::<std::result::Result<Vec<_>, _>>()?;

        Self::new(batches)
    }

    /// Saves the dataset to a Parquet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    pub fn to_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(e, path))?;

        let props = WriterProperties::builder().build();
        let mut writer = ArrowWriter::try_new(file, self.schema.clone(), Some(props))?;

        for batch in &self.batches {
            writer.write(batch)?;
        }

        writer.close()?;
        Ok(())
    }

    /// Loads a dataset from a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not valid CSV or
    /// holds no rows.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_csv_with_options(path, CsvOptions::default())
    }

    /// Loads a dataset from a CSV file with options.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the file is empty.
    pub fn from_csv_with_options(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        use std::io::{BufReader, Seek, SeekFrom};

        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(e, path))?;
        let mut buf_reader = BufReader::new(file);

        let schema = match options.schema.clone() {
            Some(schema) => Arc::new(schema),
            None => {
                let inferred = infer_csv_schema(&mut buf_reader, &options)?;
                buf_reader
                    .seek(SeekFrom::Start(0))
                    .map_err(|e| Error::io(e, path))?;
                inferred
            }
        };

        read_csv(buf_reader, schema, &options)
    }

    /// Loads a dataset from an in-memory CSV string with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid CSV or holds no rows.
    pub fn from_csv_str(data: &str) -> Result<Self> {
        Self::from_csv_str_with_options(data, CsvOptions::default())
    }

    /// Loads a dataset from an in-memory CSV string with options.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid CSV or holds no rows.
    pub fn from_csv_str_with_options(data: &str, options: CsvOptions) -> Result<Self> {
        use std::io::Cursor;

        let schema = match options.schema.clone() {
            Some(schema) => Arc::new(schema),
            None => infer_csv_schema(&mut Cursor::new(data.as_bytes()), &options)?,
        };
        read_csv(Cursor::new(data.as_bytes()), schema, &options)
    }

    /// Saves the dataset to a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        use arrow_csv::WriterBuilder;

        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| Error::io(e, path))?;

        let mut writer = WriterBuilder::new().with_header(true).build(file);

        for batch in &self.batches {
            writer.write(batch)?;
        }

        Ok(())
    }

    /// Returns the underlying batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Applies a transform to every batch to create a new dataset.
    ///
    /// Batches left without rows are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform fails on any batch, or
    /// [`Error::EmptyDataset`] if no rows survive.
    pub fn with_transform<T: Transform>(&self, transform: &T) -> Result<Self> {
        let new_batches: Vec<RecordBatch> = self
            .batches
            .iter()
            .map(|batch| transform.apply(batch.clone()))
            .filter(|result| result.as_ref().map_or(true, |b| b.num_rows() > 0))
            .collect::<Result<Vec<_>>>()?;

        Self::new(new_batches)
    }
}

impl Dataset for ArrowDataset {
    fn len(&self) -> usize {
        self.row_count
    }

    fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = RecordBatch> + Send + '_> {
        Box::new(self.batches.iter().cloned())
    }

    fn num_batches(&self) -> usize {
        self.batches.len()
    }

    fn get_batch(&self, index: usize) -> Option<&RecordBatch> {
        self.batches.get(index)
    }
}

fn csv_format(options: &CsvOptions) -> arrow_csv::reader::Format {
    let mut format = arrow_csv::reader::Format::default().with_header(options.has_header);
    if let Some(delim) = options.delimiter {
        format = format.with_delimiter(delim);
    }
    format
}

/// Infer a schema, keeping `options.text_columns` as `Utf8` whatever their
/// contents look like.
fn infer_csv_schema<R: std::io::Read>(reader: &mut R, options: &CsvOptions) -> Result<SchemaRef> {
    let (inferred, _) = csv_format(options).infer_schema(reader, Some(SCHEMA_INFER_ROWS))?;

    if options.text_columns.is_empty() {
        return Ok(Arc::new(inferred));
    }

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|field| {
            if options.text_columns.iter().any(|c| c == field.name()) {
                field.as_ref().clone().with_data_type(DataType::Utf8)
            } else {
                field.as_ref().clone()
            }
        })
        .collect();

    Ok(Arc::new(Schema::new_with_metadata(
        fields,
        inferred.metadata().clone(),
    )))
}

fn read_csv<R: std::io::Read>(
    reader: R,
    schema: SchemaRef,
    options: &CsvOptions,
) -> Result<ArrowDataset> {
    let mut builder = arrow_csv::ReaderBuilder::new(schema)
        .with_batch_size(options.batch_size)
        .with_header(options.has_header);

    if let Some(delim) = options.delimiter {
        builder = builder.with_delimiter(delim);
    }

    let batches: Vec<RecordBatch> = builder
        .build(reader)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    ArrowDataset::new(batches)
}

/// Options for CSV parsing.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row.
    pub has_header: bool,
    /// Delimiter character (default is comma).
    pub delimiter: Option<u8>,
    /// Batch size for reading.
    pub batch_size: usize,
    /// Optional schema (inferred if not provided).
    pub schema: Option<arrow::datatypes::Schema>,
    /// Columns read as text even when every value looks numeric.
    ///
    /// Identifiers such as `"007"` and `"7"` stay distinct. Names absent
    /// from the file are ignored; only applies when the schema is inferred.
    pub text_columns: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: None,
            batch_size: 8192,
            schema: None,
            text_columns: Vec::new(),
        }
    }
}

impl CsvOptions {
    /// Creates new CSV options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the file has a header row.
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Sets the delimiter character.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Sets the batch size for reading.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the schema for parsing.
    #[must_use]
    pub fn with_schema(mut self, schema: arrow::datatypes::Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Keeps the named columns as text during schema inference.
    #[must_use]
    pub fn with_text_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.text_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
mod tests {
    use arrow::{
        array::{Int32Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };

    use super::*;
    use crate::transform::Select;

    fn flights_batch(start: i32, count: usize) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("flight_id", DataType::Int32, false),
            Field::new("tail_number", DataType::Utf8, false),
        ]));

        let ids: Vec<i32> = (start..start + count as i32).collect();
        let tails: Vec<String> = ids.iter().map(|i| format!("N{}", i % 4)).collect();

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(ids)),
                Arc::new(StringArray::from(tails)),
            ],
        )
        .expect("batch creation failed")
    }

    #[test]
    fn test_new_counts_rows_across_batches() {
        let dataset = ArrowDataset::new(vec![flights_batch(0, 10), flights_batch(10, 5)])
            .expect("dataset");
        assert_eq!(dataset.len(), 15);
        assert_eq!(dataset.num_batches(), 2);
        assert!(!dataset.is_empty());
        assert!(dataset.get_batch(1).is_some());
        assert!(dataset.get_batch(2).is_none());
    }

    #[test]
    fn test_new_rejects_empty_batches() {
        let result = ArrowDataset::new(Vec::new());
        assert!(matches!(result, Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_new_rejects_schema_mismatch() {
        let other = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("x", DataType::Int32, false)])),
            vec![Arc::new(Int32Array::from(vec![1]))],
        )
        .expect("batch");
        let result = ArrowDataset::new(vec![flights_batch(0, 3), other]);
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn test_from_csv_str() {
        let csv = "flight_id,tail_number\n1,N100\n2,N200\n3,N100\n";
        let dataset = ArrowDataset::from_csv_str(csv).expect("csv");
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.schema().fields().len(), 2);
    }

    #[test]
    fn test_text_columns_keep_leading_zero_ids_distinct() {
        let csv = "tail,x\n007,1\n7,2\n08,3\n8,4\n";

        let inferred = ArrowDataset::from_csv_str(csv).expect("csv");
        assert_eq!(
            inferred.schema().field_with_name("tail").expect("tail").data_type(),
            &DataType::Int64
        );

        let options = CsvOptions::new().with_text_columns(["tail", "not_in_file"]);
        let dataset = ArrowDataset::from_csv_str_with_options(csv, options).expect("csv");
        let schema = dataset.schema();
        assert_eq!(schema.field_with_name("tail").expect("tail").data_type(), &DataType::Utf8);
        assert_eq!(schema.field_with_name("x").expect("x").data_type(), &DataType::Int64);

        let tails = dataset.batches()[0]
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("utf8")
            .iter()
            .flatten()
            .map(str::to_string)
            .collect::<Vec<_>>();
        assert_eq!(tails, ["007", "7", "08", "8"]);
    }

    #[test]
    fn test_text_columns_from_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("flights.csv");
        std::fs::write(&path, "tail,delay\n0100,1\n100,2\n").expect("write");

        let options = CsvOptions::new().with_text_columns(["tail"]);
        let loaded = ArrowDataset::from_csv_with_options(&path, options).expect("read csv");
        assert_eq!(
            loaded.schema().field(0).data_type(),
            &DataType::Utf8
        );
    }

    #[test]
    fn test_csv_roundtrip_through_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("flights.csv");

        let dataset = ArrowDataset::from_batch(flights_batch(0, 20)).expect("dataset");
        dataset.to_csv(&path).expect("write csv");

        let loaded = ArrowDataset::from_csv(&path).expect("read csv");
        assert_eq!(loaded.len(), 20);
    }

    #[test]
    fn test_csv_with_delimiter_and_batch_size() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("flights.tsv");
        std::fs::write(&path, "flight_id\ttail_number\n1\tN1\n2\tN2\n3\tN3\n").expect("write");

        let options = CsvOptions::new().with_delimiter(b'\t').with_batch_size(2);
        let loaded = ArrowDataset::from_csv_with_options(&path, options).expect("read tsv");
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.num_batches(), 2);
    }

    #[test]
    fn test_parquet_roundtrip() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("flights.parquet");

        let dataset = ArrowDataset::from_batch(flights_batch(0, 50)).expect("dataset");
        dataset.to_parquet(&path).expect("write parquet");

        let loaded = ArrowDataset::from_parquet(&path).expect("read parquet");
        assert_eq!(loaded.len(), 50);
        assert_eq!(loaded.schema(), dataset.schema());
    }

    #[test]
    fn test_from_csv_missing_file() {
        let result = ArrowDataset::from_csv("/nonexistent/flights.csv");
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_with_transform() {
        let dataset = ArrowDataset::from_batch(flights_batch(0, 8)).expect("dataset");
        let selected = dataset
            .with_transform(&Select::new(vec!["tail_number"]))
            .expect("transform");
        assert_eq!(selected.len(), 8);
        assert_eq!(selected.schema().fields().len(), 1);
    }
}
