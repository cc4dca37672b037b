// src/utils/dsub.rs: dsub job submission for single-file BAM steps

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use log::{debug, info};

use crate::config::defs::{
    DsubConfig, PipelineError, DSUB_TAG, INDEX_TEMPLATE, INFILE_VAR, OUTFILE_VAR, PROC_SUFFIX,
};
use crate::utils::command::{CommandRunner, JobCommand};
use crate::utils::file::{sidecar_path, write_sidecar, write_wrapper_script};
use crate::utils::naming::{join_prefix, parent_of, sample_stem};


#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DsubStep {
    /// Add PL:illumina to the read group header
    AddPl,
    CleanSam,
    FixMate,
    BuildBamIndex,
    SortSam,
    UnmapBam,
}

impl DsubStep {
    pub fn tag(&self) -> &'static str {
        match self {
            DsubStep::AddPl => "add-pl",
            DsubStep::CleanSam => "clean-sam",
            DsubStep::FixMate => "fix-mate",
            DsubStep::BuildBamIndex => "build-bam-index",
            DsubStep::SortSam => "sort-sam",
            DsubStep::UnmapBam => "unmap-bam",
        }
    }

    /// Output naming template used when the caller gives none.
    pub fn default_template(&self) -> &'static str {
        match self {
            DsubStep::AddPl => "{base}.head.{ext}",
            DsubStep::CleanSam => "{base}.clean.{ext}",
            DsubStep::FixMate => "{base}.fixmate.{ext}",
            DsubStep::BuildBamIndex => INDEX_TEMPLATE,
            DsubStep::SortSam => "{base}.sorted.{ext}",
            DsubStep::UnmapBam => "{base}.unmapped.{ext}",
        }
    }

    pub fn default_image<'a>(&self, config: &'a DsubConfig) -> &'a str {
        match self {
            DsubStep::AddPl => config.samtools_image.as_str(),
            _ => config.picard_image.as_str(),
        }
    }

    /// The samtools step runs without a memory floor.
    pub fn default_min_ram(&self, config: &DsubConfig) -> Option<String> {
        match self {
            DsubStep::AddPl => None,
            DsubStep::CleanSam => Some(config.clean_sam_min_ram.clone()),
            _ => Some(config.picard_min_ram.clone()),
        }
    }

    /// Command the wrapper script runs inside the container.
    pub fn default_command(&self, config: &DsubConfig) -> String {
        let inv = format!("${{{}}}", INFILE_VAR);
        let outv = format!("${{{}}}", OUTFILE_VAR);
        let picard = "java -Xmx16G -Djava.io.tmpdir=`pwd`/tmp -jar /opt/picard/picard.jar";
        match self {
            DsubStep::AddPl => format!(
                "samtools view -H {inv} | sed -e 's/SM:\\(.*\\)/SM:\\1\\tPL:illumina/' |samtools reheader -P - {inv} > {outv}"
            ),
            DsubStep::CleanSam => {
                format!("java -Xmx8G -jar /opt/picard/picard.jar CleanSam I={inv} O={outv}")
            }
            DsubStep::FixMate => format!("{picard} FixMateInformation I={inv} O={outv}"),
            DsubStep::BuildBamIndex => format!("{picard} BuildBamIndex I={inv} O={outv}"),
            DsubStep::SortSam => format!(
                "{picard} SortSam I={inv} O={outv} SORT_ORDER={}",
                config.sort_order
            ),
            DsubStep::UnmapBam => [
                format!("{picard} RevertSam I={inv} O={outv}"),
                "SANITIZE=true MAX_DISCARD_FRACTION=0.005 ATTRIBUTE_TO_CLEAR=XT ATTRIBUTE_TO_CLEAR=XN ATTRIBUTE_TO_CLEAR=X0".to_string(),
                "ATTRIBUTE_TO_CLEAR=MD ATTRIBUTE_TO_CLEAR=XG ATTRIBUTE_TO_CLEAR=XG ATTRIBUTE_TO_CLEAR=AM ATTRIBUTE_TO_CLEAR=NM".to_string(),
                "ATTRIBUTE_TO_CLEAR=SM ATTRIBUTE_TO_CLEAR=XM ATTRIBUTE_TO_CLEAR=XG ATTRIBUTE_TO_CLEAR=XO ATTRIBUTE_TO_CLEAR=X1".to_string(),
                "ATTRIBUTE_TO_CLEAR=XA SORT_ORDER=queryname RESTORE_ORIGINAL_QUALITIES=true REMOVE_DUPLICATE_INFORMATION=true REMOVE_ALIGNMENT_INFORMATION=true".to_string(),
            ]
            .join(" "),
        }
    }
}

impl fmt::Display for DsubStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}


/// One dsub submission. Optional fields fall back to the step defaults.
#[derive(Debug, Clone, Default)]
pub struct StepRequest {
    pub project: String,
    pub input: String,
    pub output: String,
    pub script_path: PathBuf,
    pub zones: Option<String>,
    pub logging: Option<String>,
    pub image: Option<String>,
    pub min_ram: Option<String>,
    pub command: Option<String>,
}

fn missing(param: &str, example: &str) -> PipelineError {
    PipelineError::MissingParameter {
        param: param.to_string(),
        example: example.to_string(),
    }
}

impl StepRequest {
    /// Presence checks for the required fields.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.project.trim().is_empty() {
            return Err(missing("Project ID", "my-project-id"));
        }
        if self.input.trim().is_empty() {
            return Err(missing("Input file", "gs://<bucket>/xxxx.bam"));
        }
        if self.output.trim().is_empty() {
            return Err(missing("Output file", "gs://<bucket>/yyyy.bam"));
        }
        if self.script_path.as_os_str().is_empty() {
            return Err(missing("Script file path", "/local/full/path/script.sh"));
        }
        Ok(())
    }
}


/// Assembles the dsub invocation for a validated request.
///
/// # Arguments
///
/// * `step` - Processing step.
/// * `config` - Shared defaults.
/// * `request` - Per-file values and overrides.
///
/// # Returns
/// JobCommand with flags in dsub order: name, project, zones, logging,
/// input, output, image, min-ram (when set), script.
pub fn build_dsub_command(step: DsubStep, config: &DsubConfig, request: &StepRequest) -> JobCommand {
    let zones = request.zones.clone().unwrap_or_else(|| config.zones.clone());
    let logging = request
        .logging
        .clone()
        .unwrap_or_else(|| join_prefix(parent_of(&request.output), "log"));
    let image = request
        .image
        .clone()
        .unwrap_or_else(|| step.default_image(config).to_string());
    let min_ram = request.min_ram.clone().or_else(|| step.default_min_ram(config));

    let mut cmd = JobCommand::new(DSUB_TAG)
        .flag("--name", sample_stem(&request.input))
        .flag("--project", request.project.as_str())
        .flag("--zones", zones)
        .flag("--logging", logging)
        .flag("--input", format!("{}={}", INFILE_VAR, request.input))
        .flag("--output", format!("{}={}", OUTFILE_VAR, request.output))
        .flag("--image", image);
    if let Some(ram) = min_ram {
        cmd = cmd.flag("--min-ram", ram);
    }
    cmd.flag("--script", request.script_path.to_string_lossy())
}


/// Writes the wrapper script, submits it through dsub and records the output.
///
/// # Arguments
///
/// * `runner` - Executes the dsub command.
/// * `step` - Processing step.
/// * `config` - Shared defaults, by value.
/// * `request` - Per-file values.
///
/// # Returns
/// Raw text printed by dsub. The same text is stored in `<script>.proc.txt`.
pub async fn submit_step<R: CommandRunner>(
    runner: &R,
    step: DsubStep,
    config: DsubConfig,
    request: &StepRequest,
) -> Result<String, PipelineError> {
    request.validate()?;

    let script_cmd = request
        .command
        .clone()
        .unwrap_or_else(|| step.default_command(&config));
    write_wrapper_script(&request.script_path, &script_cmd)?;
    debug!("Wrote {} script {}", step, request.script_path.display());

    let command = build_dsub_command(step, &config, request);
    let output = runner.run(&command).await?;

    let proc_out = sidecar_path(&request.script_path, PROC_SUFFIX);
    write_sidecar(&proc_out, &output)?;
    info!("Submitted {} for {}", step, request.input);

    Ok(output)
}
