use std::path::{Path, PathBuf};

use log::info;

use crate::cli::args::InputPairsArgs;
use crate::config::defs::{PipelineError, BAM_HEADER, BUCKET_HEADER, STEM_TEMPLATE};
use crate::utils::file::{beside, read_manifest, write_mapping};
use crate::utils::naming::derive_output;


/// Where the pairs file goes: as given, or beside the manifest when `output` is a bare name.
pub fn pairs_path(manifest: &Path, output: &str) -> PathBuf {
    if output.trim().contains('/') {
        PathBuf::from(output.trim())
    } else {
        beside(manifest, output.trim())
    }
}


/// Writes `BAM\tOUTPUT_BUCKET` pairs: each BAM against `<gs>/<sample stem>`.
///
/// # Returns
/// Path of the written pairs file.
pub fn run(args: &InputPairsArgs) -> Result<PathBuf, PipelineError> {
    let manifest = PathBuf::from(&args.input);
    let inputs = read_manifest(&manifest).map_err(|e| PipelineError::IOError(e.to_string()))?;
    let outputs = inputs
        .iter()
        .map(|bam| derive_output(bam, &args.gs, STEM_TEMPLATE))
        .collect::<Result<Vec<_>, _>>()?;

    let out_path = pairs_path(&manifest, &args.output);
    write_mapping(&out_path, (BAM_HEADER, BUCKET_HEADER), &inputs, &outputs)?;
    info!("Wrote {} input/output pairs to {}", inputs.len(), out_path.display());
    Ok(out_path)
}
