//! Basic CLI commands for loading and inspecting datasets.

use std::path::Path;

use crate::{ArrowDataset, CsvOptions, Dataset};

/// Load a dataset from a file path based on extension.
///
/// A CSV `group_column` is always read as text so that identifiers such as
/// `007` and `7` remain different groups.
pub(crate) fn load_dataset(
    path: &Path,
    delimiter: Option<char>,
    group_column: Option<&str>,
) -> crate::Result<ArrowDataset> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        "parquet" => ArrowDataset::from_parquet(path),
        "csv" | "tsv" | "txt" => {
            let mut options = CsvOptions::new().with_text_columns(group_column);
            if let Some(delim) = delimiter.or((ext == "tsv").then_some('\t')) {
                let byte = u8::try_from(delim).map_err(|_| {
                    crate::Error::invalid_config(format!("Delimiter must be ASCII, got '{delim}'"))
                })?;
                options = options.with_delimiter(byte);
            }
            ArrowDataset::from_csv_with_options(path, options)
        }
        ext => Err(crate::Error::unsupported_format(ext)),
    }
}

/// Save a dataset to a file path based on extension.
pub(crate) fn save_dataset(dataset: &ArrowDataset, path: &Path) -> crate::Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match ext {
        "parquet" => dataset.to_parquet(path),
        "csv" => dataset.to_csv(path),
        ext => Err(crate::Error::unsupported_format(ext)),
    }
}

/// Get format name from file extension.
pub(crate) fn get_format(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => "Parquet",
        Some("csv") => "CSV",
        Some("tsv") => "TSV",
        _ => "Unknown",
    }
}

/// Display dataset information.
pub(crate) fn cmd_info(path: &Path) -> crate::Result<()> {
    let dataset = load_dataset(path, None, None)?;

    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("File: {}", path.display());
    println!("Format: {}", get_format(path));
    println!("Rows: {}", dataset.len());
    println!("Batches: {}", dataset.num_batches());
    println!("Columns: {}", dataset.schema().fields().len());
    println!("Size: {} bytes", file_size);

    Ok(())
}

/// Display dataset schema.
pub(crate) fn cmd_schema(path: &Path) -> crate::Result<()> {
    let dataset = load_dataset(path, None, None)?;
    let schema = dataset.schema();

    println!("Schema for {}:", path.display());
    println!();

    for (i, field) in schema.fields().iter().enumerate() {
        let nullable = if field.is_nullable() {
            "nullable"
        } else {
            "not null"
        };
        println!(
            "  {}: {} ({}) [{}]",
            i,
            field.name(),
            field.data_type(),
            nullable
        );
    }

    println!();
    println!("Total columns: {}", schema.fields().len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLIGHTS: &str = "tail_number,origin,arr_delay\nN1,ORD,3\nN2,ATL,-1\nN1,DEN,12\n";

    #[test]
    fn test_load_csv_and_convert_to_parquet() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let csv = temp_dir.path().join("flights.csv");
        std::fs::write(&csv, FLIGHTS).expect("write");

        let dataset = load_dataset(&csv, None, None).expect("load");
        assert_eq!(dataset.len(), 3);

        let parquet = temp_dir.path().join("flights.parquet");
        save_dataset(&dataset, &parquet).expect("save");
        assert_eq!(load_dataset(&parquet, None, None).expect("reload").len(), 3);
    }

    #[test]
    fn test_load_tsv_uses_tab() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let tsv = temp_dir.path().join("flights.tsv");
        std::fs::write(&tsv, FLIGHTS.replace(',', "\t")).expect("write");

        let dataset = load_dataset(&tsv, None, None).expect("load");
        assert_eq!(dataset.schema().fields().len(), 3);
    }

    #[test]
    fn test_load_custom_delimiter() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let csv = temp_dir.path().join("flights.csv");
        std::fs::write(&csv, FLIGHTS.replace(',', ";")).expect("write");

        let dataset = load_dataset(&csv, Some(';'), None).expect("load");
        assert_eq!(dataset.schema().fields().len(), 3);

        let result = load_dataset(&csv, Some('é'), None);
        assert!(matches!(result, Err(crate::Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_group_column_loaded_as_text() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let csv = temp_dir.path().join("flights.csv");
        std::fs::write(&csv, "tail,arr_delay\n007,1\n7,2\n08,3\n8,4\n").expect("write");

        let dataset = load_dataset(&csv, None, Some("tail")).expect("load");
        let schema = dataset.schema();
        assert_eq!(schema.field(0).data_type(), &arrow::datatypes::DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &arrow::datatypes::DataType::Int64);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load_dataset(Path::new("flights.xlsx"), None, None);
        assert!(matches!(result, Err(crate::Error::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_get_format() {
        assert_eq!(get_format(Path::new("a.parquet")), "Parquet");
        assert_eq!(get_format(Path::new("a.csv")), "CSV");
        assert_eq!(get_format(Path::new("a.bin")), "Unknown");
    }

    #[test]
    fn test_cmd_info_and_schema() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let csv = temp_dir.path().join("flights.csv");
        std::fs::write(&csv, FLIGHTS).expect("write");

        assert!(cmd_info(&csv).is_ok());
        assert!(cmd_schema(&csv).is_ok());
    }
}
