use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{debug, warn};

use crate::config::defs::{PipelineError, SHEBANG};


/// Reads a manifest: one object path per line.
///
/// Lines are trimmed; blank lines are skipped.
///
/// # Arguments
///
/// * `path` - Manifest file on local disk.
///
/// # Returns
/// Vec of paths in manifest order.
pub fn read_manifest(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| anyhow!("Failed to open manifest {}: {}", path.display(), e))?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            entries.push(trimmed.to_string());
        }
    }
    debug!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}


/// Writes a tab-separated mapping file with a header row.
///
/// # Arguments
///
/// * `path` - Destination file.
/// * `header` - Column names for the first line.
/// * `inputs` - Manifest entries.
/// * `outputs` - Derived outputs, one per input.
///
/// # Returns
/// MappingMismatch when the two columns differ in length, else unit.
pub fn write_mapping(
    path: &Path,
    header: (&str, &str),
    inputs: &[String],
    outputs: &[String],
) -> Result<(), PipelineError> {
    if inputs.len() != outputs.len() {
        return Err(PipelineError::MappingMismatch {
            manifest: path.display().to_string(),
            inputs: inputs.len(),
            outputs: outputs.len(),
        });
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}\t{}", header.0, header.1)?;
    for (input, output) in inputs.iter().zip(outputs) {
        writeln!(writer, "{}\t{}", input, output)?;
    }
    writer.flush()?;
    Ok(())
}


/// Path of a file placed in the same directory as `sibling`.
pub fn beside(sibling: &Path, file_name: &str) -> PathBuf {
    match sibling.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}


/// Creates a directory and its parents. Safe to call repeatedly.
///
/// Failures are logged and otherwise ignored; a later write into the
/// directory surfaces the real problem.
pub fn ensure_dir(path: &Path) {
    if let Err(e) = fs::create_dir_all(path) {
        warn!("Could not create directory {}: {}", path.display(), e);
    }
}


/// Writes a job wrapper script: shebang plus a single command line.
pub fn write_wrapper_script(path: &Path, command: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", SHEBANG)?;
    writeln!(file, "{}", command)?;
    Ok(())
}


/// Side-car file name for a script: `<script>.<suffix>`.
pub fn sidecar_path(script: &Path, suffix: &str) -> PathBuf {
    let mut name = script.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}


/// Writes text verbatim to a side-car file.
pub fn write_sidecar(path: &Path, text: &str) -> io::Result<()> {
    fs::write(path, text.trim())
}


/// Loads one column of a headerless, tab-separated table.
///
/// # Arguments
///
/// * `path` - Table file.
/// * `column` - Zero-based column index.
///
/// # Returns
/// Column values in row order; ColumnOutOfRange when a row is too short.
pub fn read_column(path: &Path, column: usize) -> Result<Vec<String>, PipelineError> {
    let file = File::open(path)?;
    let mut values = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        let value = line.split('\t').nth(column).ok_or_else(|| PipelineError::ColumnOutOfRange {
            file: path.display().to_string(),
            line: idx + 1,
            column,
        })?;
        values.push(value.to_string());
    }
    Ok(values)
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_manifest_skips_blank_lines() -> Result<()> {
        let dir = tempdir()?;
        let manifest = dir.path().join("bams.txt");
        fs::write(&manifest, "gs://b/a.bam\n\n  gs://b/b.bam  \n")?;

        let entries = read_manifest(&manifest)?;
        assert_eq!(entries, vec!["gs://b/a.bam", "gs://b/b.bam"]);
        Ok(())
    }

    #[test]
    fn test_write_mapping_has_header_plus_entries() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("map.txt");
        let inputs = vec!["gs://b/a.bam".to_string(), "gs://b/b.bam".to_string()];
        let outputs = vec!["gs://o/a".to_string(), "gs://o/b".to_string()];
        write_mapping(&out, ("BAM", "OUTPUT_BUCKET"), &inputs, &outputs)?;

        let text = fs::read_to_string(&out)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "BAM\tOUTPUT_BUCKET");
        assert_eq!(lines[2], "gs://b/b.bam\tgs://o/b");
        Ok(())
    }

    #[test]
    fn test_write_mapping_rejects_mismatch() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("map.txt");
        let err = write_mapping(&out, ("A", "B"), &["x".to_string()], &[]).unwrap_err();
        assert!(matches!(err, PipelineError::MappingMismatch { inputs: 1, outputs: 0, .. }));
        assert!(!out.exists());
        Ok(())
    }

    #[test]
    fn test_ensure_dir_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let scripts = dir.path().join("scripts/nested");
        ensure_dir(&scripts);
        ensure_dir(&scripts);
        assert!(scripts.is_dir());
        Ok(())
    }

    #[test]
    fn test_sidecar_path() {
        let p = sidecar_path(Path::new("/tmp/scripts/dsub_000.sh"), "proc.txt");
        assert_eq!(p, PathBuf::from("/tmp/scripts/dsub_000.sh.proc.txt"));
    }

    #[test]
    fn test_read_column() -> Result<()> {
        let dir = tempdir()?;
        let table = dir.path().join("t.tsv");
        fs::write(&table, "a\tgs://x/a.bam\n\nb\tgs://x/b.bam\n")?;
        assert_eq!(read_column(&table, 1)?, vec!["gs://x/a.bam", "gs://x/b.bam"]);
        assert!(matches!(
            read_column(&table, 2),
            Err(PipelineError::ColumnOutOfRange { line: 1, column: 2, .. })
        ));
        Ok(())
    }
}
