use clap::{Args, Parser, Subcommand};

use crate::config::defs::{GATK_PREFIX, GENOMICS_ZONES};
use crate::utils::dsub::DsubStep;

#[derive(Parser, Debug, Clone)]
#[command(name = "gcloud-bam-pipelines", version, about = "Prepare manifests and submit BAM processing jobs to Google Cloud")]
pub struct Arguments {
    #[arg(short = 'v', long = "verbose", action, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub module: Module,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Module {
    /// Write BAM / output-bucket pairs for a manifest
    InputPairs(InputPairsArgs),
    /// Submit one picard BuildBamIndex job per BAM
    BuildBamIndex(BamIndexArgs),
    /// Submit one dsub job per BAM for any processing step
    Submit(SubmitArgs),
    /// Check which reference files have a counterpart in a target list
    CmpFiles(CmpFilesArgs),
    /// Submit the GATK germline workflow for each unmapped BAM
    GenPipe(GenPipeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct InputPairsArgs {
    #[arg(short = 'i', long = "input", help = "A file containing the list of BAM files in Google storage")]
    pub input: String,

    #[arg(short = 'o', long = "output", help = "Name of the output file. Without a directory it is stored beside the input file")]
    pub output: String,

    #[arg(short = 's', long = "gs", help = "Google Cloud storage to store the results")]
    pub gs: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BamIndexArgs {
    #[arg(short = 'i', long = "input", help = "List of file names in cloud storage to be run")]
    pub input: String,

    #[arg(short = 'o', long = "output", help = "Output Google storage directory (gs://your-bucket)")]
    pub output: String,

    #[arg(short = 's', long = "script", help = "Local directory to store dsub scripts")]
    pub script: String,

    #[arg(short = 'p', long = "project", help = "Google project ID (e.g., my-project-name)")]
    pub project: String,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[arg(long, value_enum)]
    pub step: DsubStep,

    #[command(flatten)]
    pub common: BamIndexArgs,

    #[arg(long, help = "Output naming template using {name}, {stem}, {base} and {ext}")]
    pub template: Option<String>,

    #[arg(long)]
    pub zones: Option<String>,

    #[arg(long)]
    pub image: Option<String>,

    #[arg(long = "min-ram")]
    pub min_ram: Option<String>,

    #[arg(long = "sort-order")]
    pub sort_order: Option<String>,

    #[arg(long, help = "Command for the wrapper script; may reference ${INFILE} and ${OUTFILE}")]
    pub command: Option<String>,

    #[arg(long, help = "Log destination [Default = <output>/log]")]
    pub logging: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CmpFilesArgs {
    #[arg(short = 'r', long = "ref", help = "List of file names used as reference")]
    pub reference: String,

    #[arg(short = 't', long = "target", help = "List of file names compared against the reference")]
    pub target: String,

    #[arg(short = 'o', long = "out", help = "Output directory for matched.txt and missing.txt")]
    pub out: String,

    #[arg(short = 'i', long = "refidx", default_value_t = 0, help = "Column index of the reference file [Default = 0]")]
    pub refidx: usize,

    #[arg(short = 'j', long = "tgidx", default_value_t = 0, help = "Column index of the target file [Default = 0]")]
    pub tgidx: usize,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenPipeArgs {
    #[arg(short = 'i', long = "input", help = "List of unmapped BAM files in cloud storage to be run")]
    pub input: String,

    #[arg(short = 'o', long = "output", help = "Output Google storage directory (gs://your-bucket)")]
    pub output: String,

    #[arg(short = 's', long = "script", help = "Local directory to store working scripts")]
    pub script: String,

    #[arg(short = 'g', long = "gatkdir", help = "GATK Best Practices Pipeline templates, e.g. /usr/local/broad-prod-wgs-germline-snps-indels")]
    pub gatkdir: String,

    #[arg(short = 'w', long = "wdl", help = "WDL directory from the GATK Best Practices examples, e.g. /usr/local/wdl")]
    pub wdl: String,

    #[arg(short = 'z', long = "zone", default_value = GENOMICS_ZONES)]
    pub zone: String,

    #[arg(short = 'x', long = "prefix", default_value = GATK_PREFIX)]
    pub prefix: String,
}
