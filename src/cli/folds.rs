//! Fold reporting and export commands.

use std::path::Path;

use log::info;

use super::{
    basic::{load_dataset, save_dataset},
    OutputFormat, ReportFormat, SplitArgs,
};
use crate::{ArrowDataset, Chain, Dataset, DropNulls, FoldReport, GroupKFold, Rename};

/// Load the input and apply the cleaning steps requested on the command line.
pub(crate) fn prepare_dataset(args: &SplitArgs) -> crate::Result<ArrowDataset> {
    // The group column is named as in the file, before any rename.
    let source_group = args
        .rename
        .iter()
        .find(|(_, new)| *new == args.group)
        .map_or(args.group.as_str(), |(old, _)| old.as_str());
    let dataset = load_dataset(&args.path, args.delimiter, Some(source_group))?;
    let loaded = dataset.len();

    let mut chain = Chain::new();
    if let Some(columns) = &args.drop_nulls {
        chain = chain.then(DropNulls::columns(columns.iter().cloned()));
    }
    if !args.rename.is_empty() {
        chain = chain.then(Rename::from_pairs(args.rename.iter().cloned()));
    }

    if chain.is_empty() {
        return Ok(dataset);
    }

    let cleaned = dataset.with_transform(&chain)?;
    info!(
        "{}: {} rows loaded, {} kept after cleaning",
        args.path.display(),
        loaded,
        cleaned.len()
    );
    Ok(cleaned)
}

/// Render a fold report as a text table.
pub(crate) fn render_text(report: &FoldReport, group_column: &str) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} rows, {} groups ('{}'), {} folds",
        report.total_rows, report.total_groups, group_column, report.n_splits
    );
    let _ = writeln!(
        out,
        "{:>4}  {:>10}  {:>10}  {:>8}  sample groups",
        "fold", "train", "test", "groups"
    );

    for fold in &report.folds {
        let sample: Vec<String> = fold.test_groups.iter().take(5).map(ToString::to_string).collect();
        let more = fold.test_groups.len().saturating_sub(sample.len());
        let suffix = if more > 0 {
            format!(", ... (+{more})")
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "{:>4}  {:>10}  {:>10}  {:>8}  {}{}",
            fold.fold,
            fold.train_rows,
            fold.test_rows,
            fold.test_group_count,
            sample.join(", "),
            suffix
        );
    }

    let _ = writeln!(out, "max test row spread: {}", report.row_spread());
    out
}

/// Show how rows and groups fall into folds.
pub(crate) fn cmd_folds(args: &SplitArgs, format: ReportFormat) -> crate::Result<()> {
    let dataset = prepare_dataset(args)?;
    let report = GroupKFold::new(args.n_splits).report(&dataset, &args.group)?;

    match format {
        ReportFormat::Text => print!("{}", render_text(&report, &args.group)),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| crate::Error::Format(e.to_string()))?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Write every fold's train and test set under `output_dir`.
pub(crate) fn cmd_export(
    args: &SplitArgs,
    output_dir: &Path,
    output_format: OutputFormat,
) -> crate::Result<()> {
    let dataset = prepare_dataset(args)?;

    std::fs::create_dir_all(output_dir).map_err(|e| crate::Error::io(e, output_dir))?;

    let ext = output_format.extension();
    for split in GroupKFold::new(args.n_splits).split_dataset(&dataset, &args.group)? {
        let split = split?;
        let train_path = output_dir.join(format!("fold_{}_train.{ext}", split.fold()));
        let test_path = output_dir.join(format!("fold_{}_test.{ext}", split.fold()));

        save_dataset(split.train(), &train_path)?;
        save_dataset(split.test(), &test_path)?;

        println!(
            "fold {}: {} train rows -> {}, {} test rows -> {}",
            split.fold(),
            split.train().len(),
            train_path.display(),
            split.test().len(),
            test_path.display()
        );
    }

    Ok(())
}
