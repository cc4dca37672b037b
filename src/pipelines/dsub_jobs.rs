use std::path::{Path, PathBuf};

use log::info;

use crate::cli::args::{BamIndexArgs, SubmitArgs};
use crate::config::defs::{DsubConfig, PipelineError, BAM_HEADER, INDEX_MAPPING_FILE, OUTPUT_HEADER};
use crate::utils::command::CommandRunner;
use crate::utils::dsub::{submit_step, DsubStep, StepRequest};
use crate::utils::file::{beside, ensure_dir, read_manifest, write_mapping};
use crate::utils::naming::{derive_output, join_prefix};


/// Everything a manifest-wide dsub run needs beyond the manifest itself.
#[derive(Debug, Clone)]
pub struct StepPlan {
    pub step: DsubStep,
    pub template: String,
    pub mapping_file: String,
    /// Overrides copied onto every request.
    pub overrides: StepRequest,
}

impl StepPlan {
    pub fn for_step(step: DsubStep) -> Self {
        let mapping_file = match step {
            DsubStep::BuildBamIndex => INDEX_MAPPING_FILE.to_string(),
            other => format!("mapBAM-{}.txt", other.tag()),
        };
        Self {
            step,
            template: step.default_template().to_string(),
            mapping_file,
            overrides: StepRequest::default(),
        }
    }
}


/// Wrapper script path for the i-th manifest entry.
pub fn script_for(script_dir: &Path, index: usize) -> PathBuf {
    script_dir.join(format!("dsub_{:03}.sh", index))
}


/// Reads the manifest, writes the mapping file and submits one job per entry, in order.
///
/// # Arguments
///
/// * `args` - Manifest, output prefix, script directory and project.
/// * `plan` - Step, naming template and overrides.
/// * `config` - Shared dsub defaults.
/// * `runner` - Executes dsub.
///
/// # Returns
/// Raw dsub output per submitted entry.
pub async fn submit_manifest<R: CommandRunner>(
    args: &BamIndexArgs,
    plan: &StepPlan,
    config: &DsubConfig,
    runner: &R,
) -> Result<Vec<String>, PipelineError> {
    let script_dir = PathBuf::from(&args.script);
    ensure_dir(&script_dir);

    let manifest = PathBuf::from(&args.input);
    let inputs = read_manifest(&manifest).map_err(|e| PipelineError::IOError(e.to_string()))?;
    let outputs = inputs
        .iter()
        .map(|bam| derive_output(bam, &args.output, &plan.template))
        .collect::<Result<Vec<_>, _>>()?;

    let mapping = beside(&manifest, &plan.mapping_file);
    write_mapping(&mapping, (BAM_HEADER, OUTPUT_HEADER), &inputs, &outputs)?;
    info!("Wrote {} mapping to {}", plan.step, mapping.display());

    let logging = plan
        .overrides
        .logging
        .clone()
        .unwrap_or_else(|| join_prefix(&args.output, "log"));
    let total = inputs.len();
    let mut results = Vec::with_capacity(total);

    for (i, (input, output)) in inputs.iter().zip(&outputs).enumerate() {
        println!("[{}/{}] {} is processing...", i + 1, total, input);
        let request = StepRequest {
            project: args.project.clone(),
            input: input.clone(),
            output: output.clone(),
            script_path: script_for(&script_dir, i),
            logging: Some(logging.clone()),
            ..plan.overrides.clone()
        };
        results.push(submit_step(runner, plan.step, config.clone(), &request).await?);
        println!();
    }

    Ok(results)
}


/// BAM index driver: `<output>/<name>.bai` per BAM, mapping in `mapBAM-index.txt`.
pub async fn run_index<R: CommandRunner>(
    args: &BamIndexArgs,
    config: &DsubConfig,
    runner: &R,
) -> Result<Vec<String>, PipelineError> {
    submit_manifest(args, &StepPlan::for_step(DsubStep::BuildBamIndex), config, runner).await
}


/// Generic driver for any dsub step, honouring CLI overrides.
pub async fn run_step<R: CommandRunner>(
    args: &SubmitArgs,
    config: &DsubConfig,
    runner: &R,
) -> Result<Vec<String>, PipelineError> {
    let mut plan = StepPlan::for_step(args.step);
    if let Some(template) = &args.template {
        plan.template = template.clone();
    }
    plan.overrides = StepRequest {
        zones: args.zones.clone(),
        image: args.image.clone(),
        min_ram: args.min_ram.clone(),
        command: args.command.clone(),
        logging: args.logging.clone(),
        ..Default::default()
    };

    let mut config = config.clone();
    if let Some(order) = &args.sort_order {
        config.sort_order = order.clone();
    }
    submit_manifest(&args.common, &plan, &config, runner).await
}
