use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::cli::args::CmpFilesArgs;
use crate::config::defs::{PipelineError, MATCHED_FILE, MISSING_FILE};
use crate::utils::file::{ensure_dir, read_column};
use crate::utils::naming::sample_stem;


#[derive(Debug, Default, PartialEq)]
pub struct Comparison {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}


/// Splits reference paths by whether any target contains their sample stem.
///
/// Containment is a plain substring test, so stem `s1` is found in `s10.bam`.
pub fn compare(references: &[String], targets: &[String]) -> Comparison {
    let mut result = Comparison::default();
    for reference in references {
        let stem = sample_stem(reference);
        let found = targets.iter().find(|t| t.contains(stem));
        let path = reference.trim().to_string();
        match found {
            Some(target) => {
                debug!("MATCH >> Ref={}\tTg={}", reference, target);
                result.matched.push(path);
            }
            None => {
                debug!("NONE >> Ref={} cannot be found", reference);
                result.missing.push(path);
            }
        }
    }
    result
}


fn write_lines(path: &Path, lines: &[String]) -> Result<(), PipelineError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}


/// Compares the chosen columns of two lists and writes matched.txt / missing.txt.
///
/// # Returns
/// The comparison written to disk.
pub fn run(args: &CmpFilesArgs) -> Result<Comparison, PipelineError> {
    let out_dir = PathBuf::from(&args.out);
    ensure_dir(&out_dir);

    let references = read_column(Path::new(&args.reference), args.refidx)?;
    let targets = read_column(Path::new(&args.target), args.tgidx)?;
    let result = compare(&references, &targets);

    write_lines(&out_dir.join(MATCHED_FILE), &result.matched)?;
    write_lines(&out_dir.join(MISSING_FILE), &result.missing)?;
    info!(
        "{} of {} reference files matched, {} missing",
        result.matched.len(),
        references.len(),
        result.missing.len()
    );
    Ok(result)
}
