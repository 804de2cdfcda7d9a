use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use harvest_core::PostRecord;
use harvest_core::encode::{decode_json, encode_csv, encode_json};
use harvest_core::store::merge_records;
use harvest_core::util::batch_file_stem;

pub const COMBINED_STEM: &str = "combined_posts";

/// Write the whole run's records as `{context}_{timestamp}_{count}.csv/.json`.
pub fn export_run(dir: &Path, context: &str, records: &[PostRecord]) -> Result<Vec<PathBuf>> {
    let stem = batch_file_stem(context, Local::now().naive_local(), records.len());
    write_pair(dir, &stem, records)
}

/// Outcome of [`combine`].
#[derive(Debug)]
pub struct CombineReport {
    pub files_read: usize,
    pub files_skipped: usize,
    pub records: usize,
    pub written: Vec<PathBuf>,
}

/// Merge every batch JSON file below `input` into one deduplicated set
/// and write it to `output/combined_posts.{csv,json}`.
///
/// Files that do not decode as a batch are skipped with a warning.
pub fn combine(input: &Path, output: &Path) -> Result<CombineReport> {
    // A missing output directory holds nothing to exclude.
    let exclude = std::fs::canonicalize(output).ok();
    let mut files = Vec::new();
    collect_json_files(input, exclude.as_deref(), &mut files)?;
    files.sort();

    let mut batches = Vec::with_capacity(files.len());
    let mut skipped = 0;
    for path in &files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match decode_json(&text) {
            Ok(batch) => batches.push(batch),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping file that is not a post batch");
                skipped += 1;
            }
        }
    }

    let files_read = batches.len();
    let merged = merge_records(batches);
    let written = write_pair(output, COMBINED_STEM, &merged)?;

    Ok(CombineReport {
        files_read,
        files_skipped: skipped,
        records: merged.len(),
        written,
    })
}

fn write_pair(dir: &Path, stem: &str, records: &[PostRecord]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let csv_path = dir.join(format!("{stem}.csv"));
    let json_path = dir.join(format!("{stem}.json"));
    std::fs::write(&csv_path, encode_csv(records)?)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    std::fs::write(&json_path, encode_json(records)?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    Ok(vec![csv_path, json_path])
}

/// Recursive `*.json` listing that leaves out the (canonical) output
/// directory so a previous combined file is never merged into itself.
fn collect_json_files(dir: &Path, exclude: Option<&Path>, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            let excluded = exclude.is_some_and(|ex| {
                std::fs::canonicalize(&path).is_ok_and(|canonical| canonical == ex)
            });
            if !excluded {
                collect_json_files(&path, exclude, out)?;
            }
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::encode::encode_json;

    fn records(ids: &[&str]) -> Vec<PostRecord> {
        ids.iter().map(|id| PostRecord::bare(*id)).collect()
    }

    #[test]
    fn export_writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_run(dir.path(), "mentalhealth", &records(&["a", "b"])).unwrap();

        assert_eq!(written.len(), 2);
        let name = written[0].file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("mentalhealth_"));
        assert!(name.ends_with("_2.csv"));
        let json = std::fs::read_to_string(&written[1]).unwrap();
        assert_eq!(decode_json(&json).unwrap(), records(&["a", "b"]));
    }

    #[test]
    fn combine_merges_nested_batches_and_skips_junk() {
        let input = tempfile::tempdir().unwrap();
        let nested = input.path().join("data/raw/anxiety-posts");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            nested.join("anxiety_2024-01-01_00-00-00_2.json"),
            encode_json(&records(&["a", "b"])).unwrap(),
        )
        .unwrap();
        std::fs::write(
            nested.join("anxiety_2024-01-01_00-01-00_2.json"),
            encode_json(&records(&["b", "c"])).unwrap(),
        )
        .unwrap();
        std::fs::write(input.path().join("notes.json"), r#"{"not": "a batch"}"#).unwrap();

        let output = input.path().join("combined");
        let report = combine(input.path(), &output).unwrap();

        assert_eq!(report.files_read, 2);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.records, 3);

        let json = std::fs::read_to_string(output.join("combined_posts.json")).unwrap();
        let ids: Vec<_> = decode_json(&json)
            .unwrap()
            .into_iter()
            .map(|r| r.post_id)
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);

        // Running again does not fold the combined output back in.
        let again = combine(input.path(), &output).unwrap();
        assert_eq!(again.files_read, 2);
    }

    #[test]
    fn combine_skips_output_dir_spelled_differently() {
        let input = tempfile::tempdir().unwrap();
        let nested = input.path().join("data/raw/anxiety-posts");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            nested.join("anxiety_2024-01-01_00-00-00_1.json"),
            encode_json(&records(&["a"])).unwrap(),
        )
        .unwrap();

        let combined = input.path().join("combined");
        std::fs::create_dir_all(&combined).unwrap();
        std::fs::write(
            combined.join("combined_posts.json"),
            encode_json(&records(&["stale"])).unwrap(),
        )
        .unwrap();

        let output = input.path().join("data/raw/../../combined");
        let report = combine(input.path(), &output).unwrap();

        assert_eq!(report.files_read, 1);
        assert_eq!(report.records, 1);
        let json = std::fs::read_to_string(combined.join("combined_posts.json")).unwrap();
        let ids: Vec<_> = decode_json(&json)
            .unwrap()
            .into_iter()
            .map(|r| r.post_id)
            .collect();
        assert_eq!(ids, ["a"]);
    }
}
