use thiserror::Error;

// External software
pub const DSUB_TAG: &str = "dsub";
pub const GCLOUD_TAG: &str = "gcloud";

// Default container images
pub const SAMTOOLS_IMAGE: &str = "zlskidmore/samtools:1.4.1";
pub const PICARD_IMAGE: &str = "maxulysse/picard";

// Zones
pub const DSUB_ZONES: &str = "us-*";
pub const GENOMICS_ZONES: &str = "us-central1-f";

// Wrapper scripts
pub const SHEBANG: &str = "#!/bin/bash";
pub const INFILE_VAR: &str = "INFILE";
pub const OUTFILE_VAR: &str = "OUTFILE";
pub const PROC_SUFFIX: &str = "proc.txt";
pub const RAW_OUT_SUFFIX: &str = "out.txt";

// Static Filenames
pub const INDEX_MAPPING_FILE: &str = "mapBAM-index.txt";
pub const GS_MAPPING_FILE: &str = "mapBAM-GS.txt";
pub const MATCHED_FILE: &str = "matched.txt";
pub const MISSING_FILE: &str = "missing.txt";

// Mapping headers
pub const BAM_HEADER: &str = "BAM";
pub const BUCKET_HEADER: &str = "OUTPUT_BUCKET";
pub const OUTPUT_HEADER: &str = "OUTPUT";

// GATK best practices layout
pub const GATK_PREFIX: &str = "PairedEndSingleSampleWf";
pub const GATK_WORKFLOW: &str = "PairedEndSingleSampleWorkflow";
pub const GATK_INPUTS_SUFFIX: &str = "hg38.inputs.json";
pub const GATK_OPTIONS_SUFFIX: &str = "gatk4.0.options.json";
pub const GATK_WDL_SUFFIX: &str = "gatk4.0.wdl";
pub const WDL_RUNNER_YAML: &str = "runners/cromwell_on_google/wdl_runner/wdl_pipeline.yaml";
pub const GENOMICS_MEMORY: &str = "5";

// Naming templates
pub const STEM_TEMPLATE: &str = "{stem}";
pub const INDEX_TEMPLATE: &str = "{name}.bai";


#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{param} must be given!! Example) {example}")]
    MissingParameter { param: String, example: String },

    #[error("The number of inputs ({inputs}) and outputs ({outputs}) are different. Please check {manifest}")]
    MappingMismatch { manifest: String, inputs: usize, outputs: usize },

    #[error("Column {column} not present in line {line} of {file}")]
    ColumnOutOfRange { file: String, line: usize, column: usize },

    #[error("Invalid naming template: {0}")]
    InvalidTemplate(String),

    #[error("Required command not found in PATH: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {tool}: {error}")]
    ToolExecution { tool: String, error: String },

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::IOError(e.to_string())
    }
}


/// Defaults shared by every dsub submission step.
///
/// Per-call overrides on a `StepRequest` win over these values.
#[derive(Debug, Clone, PartialEq)]
pub struct DsubConfig {
    /// Compute Engine zones jobs may run in. Default `us-*`.
    pub zones: String,
    /// Image for the header PL repair step. Default `zlskidmore/samtools:1.4.1`.
    pub samtools_image: String,
    /// Image for every picard step. Default `maxulysse/picard`.
    pub picard_image: String,
    /// Memory floor (GB) for CleanSam. Default `9`.
    pub clean_sam_min_ram: String,
    /// Memory floor (GB) for the remaining picard steps. Default `17`.
    pub picard_min_ram: String,
    /// SORT_ORDER handed to picard SortSam. Default `coordinate`.
    pub sort_order: String,
}

impl Default for DsubConfig {
    fn default() -> Self {
        Self {
            zones: DSUB_ZONES.to_string(),
            samtools_image: SAMTOOLS_IMAGE.to_string(),
            picard_image: PICARD_IMAGE.to_string(),
            clean_sam_min_ram: "9".to_string(),
            picard_min_ram: "17".to_string(),
            sort_order: "coordinate".to_string(),
        }
    }
}


/// Defaults for the GATK germline workflow submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomicsConfig {
    /// Default `us-central1-f`.
    pub zones: String,
    /// Memory (GB) of the cromwell runner VM. Default `5`.
    pub memory: String,
    /// File prefix of the GATK templates. Default `PairedEndSingleSampleWf`.
    pub prefix: String,
}

impl Default for GenomicsConfig {
    fn default() -> Self {
        Self {
            zones: GENOMICS_ZONES.to_string(),
            memory: GENOMICS_MEMORY.to_string(),
            prefix: GATK_PREFIX.to_string(),
        }
    }
}
