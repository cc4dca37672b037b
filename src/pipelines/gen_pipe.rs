use std::path::PathBuf;

use log::info;

use crate::cli::args::GenPipeArgs;
use crate::config::defs::{GenomicsConfig, PipelineError, BAM_HEADER, BUCKET_HEADER, GS_MAPPING_FILE, STEM_TEMPLATE};
use crate::utils::command::CommandRunner;
use crate::utils::file::{beside, ensure_dir, read_manifest, write_mapping};
use crate::utils::genomics::{submit_workflow, WorkflowRequest};
use crate::utils::naming::{derive_output, join_prefix};


/// Submits the GATK germline workflow once per unmapped BAM, in manifest order.
///
/// # Arguments
///
/// * `args` - Manifest, output bucket, script/template directories, zone and prefix.
/// * `runner` - Executes gcloud.
///
/// # Returns
/// (input, operation ID) per submitted entry.
pub async fn run<R: CommandRunner>(
    args: &GenPipeArgs,
    runner: &R,
) -> Result<Vec<(String, String)>, PipelineError> {
    let script_dir = PathBuf::from(&args.script);
    ensure_dir(&script_dir);

    let manifest = PathBuf::from(&args.input);
    let inputs = read_manifest(&manifest).map_err(|e| PipelineError::IOError(e.to_string()))?;
    let outputs = inputs
        .iter()
        .map(|bam| derive_output(bam, &args.output, STEM_TEMPLATE))
        .collect::<Result<Vec<_>, _>>()?;

    let mapping = beside(&manifest, GS_MAPPING_FILE);
    write_mapping(&mapping, (BAM_HEADER, BUCKET_HEADER), &inputs, &outputs)?;

    let config = GenomicsConfig {
        zones: args.zone.clone(),
        prefix: args.prefix.clone(),
        ..Default::default()
    };
    let total = inputs.len();
    let mut jobs = Vec::with_capacity(total);

    for (i, (input, out_dir)) in inputs.iter().zip(&outputs).enumerate() {
        println!("[{}/{}] {} is processing...", i + 1, total, input);
        let request = WorkflowRequest {
            input: input.clone(),
            script_dir: script_dir.clone(),
            gatk_dir: PathBuf::from(&args.gatkdir),
            out_dir: out_dir.clone(),
            wdl_dir: PathBuf::from(&args.wdl),
            logging: Some(join_prefix(out_dir, "logs")),
        };
        let job_id = submit_workflow(runner, config.clone(), &request).await?;
        info!("{} -> operation {:?}", input, job_id);
        jobs.push((input.clone(), job_id));
        println!();
    }

    Ok(jobs)
}
