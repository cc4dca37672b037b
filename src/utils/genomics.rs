// src/utils/genomics.rs: GATK germline workflow submission via gcloud genomics pipelines

use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use serde_json::{Map, Value};

use crate::config::defs::{
    GenomicsConfig, PipelineError, GATK_INPUTS_SUFFIX, GATK_OPTIONS_SUFFIX, GATK_WDL_SUFFIX,
    GATK_WORKFLOW, GCLOUD_TAG, PROC_SUFFIX, RAW_OUT_SUFFIX, WDL_RUNNER_YAML,
};
use crate::utils::command::{CommandRunner, JobCommand};
use crate::utils::file::{ensure_dir, sidecar_path, write_sidecar};
use crate::utils::naming::{join_prefix, sample_stem};

lazy_static! {
    static ref OPERATION_ID: Regex = Regex::new(r"operations/(.+?)\]").expect("valid operation regex");
}


/// One workflow submission for a single unmapped BAM.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRequest {
    /// Unmapped BAM in cloud storage.
    pub input: String,
    /// Local directory receiving per-sample inputs and side-cars.
    pub script_dir: PathBuf,
    /// Local GATK best-practices template directory.
    pub gatk_dir: PathBuf,
    /// Cloud storage prefix for this sample's outputs.
    pub out_dir: String,
    /// Local WDL runner checkout.
    pub wdl_dir: PathBuf,
    /// Defaults to `<out_dir>/logs`.
    pub logging: Option<String>,
}

fn missing(param: &str, example: &str) -> PipelineError {
    PipelineError::MissingParameter {
        param: param.to_string(),
        example: example.to_string(),
    }
}

impl WorkflowRequest {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.input.trim().is_empty() {
            return Err(missing("Input file", "gs://<bucket>/xxxx.bam"));
        }
        if self.script_dir.as_os_str().is_empty() {
            return Err(missing("Script directory", "/local/full/path/scripts"));
        }
        if self.gatk_dir.as_os_str().is_empty() {
            return Err(missing(
                "GATK Best Practices Pipeline template directory",
                "/usr/local/broad-prod-wgs-germline-snps-indels",
            ));
        }
        if self.out_dir.trim().is_empty() {
            return Err(missing("Output cloud storage", "gs://my-cloud-storage"));
        }
        if self.wdl_dir.as_os_str().is_empty() {
            return Err(missing("WDL directory", "/usr/local/wdl"));
        }
        Ok(())
    }

    pub fn sample(&self) -> &str {
        sample_stem(&self.input)
    }
}


/// Pulls the operation ID out of gcloud's submission text.
///
/// # Returns
/// The ID, or an empty string when the text carries none.
pub fn extract_job_id(text: &str) -> String {
    OPERATION_ID
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}


/// Shell command that reports the state of a submitted operation.
pub fn status_command(job_id: &str) -> String {
    format!(
        "{} alpha genomics operations describe {} --format='yaml(done, error, metadata.events)'",
        GCLOUD_TAG,
        job_id.trim()
    )
}


/// Copies `<gatk_dir>/<prefix>.*` into `dest`, renaming the first dot-segment to `sample`.
///
/// # Returns
/// Destination paths in sorted order.
pub fn copy_templates(gatk_dir: &Path, prefix: &str, sample: &str, dest: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let lead = format!("{}.", prefix);
    let mut sources: Vec<PathBuf> = fs::read_dir(gatk_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&lead))
        })
        .collect();
    sources.sort();

    let mut copied = Vec::with_capacity(sources.len());
    for src in sources {
        let name = src.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let renamed = match name.split_once('.') {
            Some((_, rest)) => format!("{}.{}", sample, rest),
            None => sample.to_string(),
        };
        let dst = dest.join(renamed);
        debug!("{}", dst.display());
        fs::copy(&src, &dst)?;
        copied.push(dst);
    }
    Ok(copied)
}


/// Rewrites the sample-specific keys of a workflow inputs JSON, keeping key order.
pub fn patch_inputs(template: &str, sample: &str, input: &str) -> Result<String, PipelineError> {
    let mut data: Map<String, Value> = serde_json::from_str(template)
        .map_err(|e| PipelineError::IOError(format!("Invalid workflow inputs JSON: {}", e)))?;

    let key = |field: &str| format!("{}.{}", GATK_WORKFLOW, field);
    data.insert(key("base_file_name"), Value::from(sample));
    data.insert(key("final_gvcf_base_name"), Value::from(sample));
    data.insert(key("sample_name"), Value::from(sample));
    data.insert(key("fingerprint_genotypes_file"), Value::from(""));
    data.insert(key("flowcell_unmapped_bams"), Value::from(vec![input.to_string()]));

    serde_json::to_string(&data).map_err(|e| PipelineError::IOError(e.to_string()))
}


/// Builds the gcloud pipelines run invocation.
pub fn build_gcloud_command(
    config: &GenomicsConfig,
    request: &WorkflowRequest,
    inputs_json: &Path,
    options_json: &Path,
    logging: &str,
) -> JobCommand {
    let yml = request.wdl_dir.join(WDL_RUNNER_YAML);
    let wdl = request
        .gatk_dir
        .join(format!("{}.{}", config.prefix, GATK_WDL_SUFFIX));

    JobCommand::new(GCLOUD_TAG)
        .arg("alpha")
        .arg("genomics")
        .arg("pipelines")
        .arg("run")
        .flag("--pipeline-file", yml.to_string_lossy())
        .flag("--zones", config.zones.as_str())
        .flag("--memory", config.memory.as_str())
        .flag("--logging", logging)
        .flag("--inputs-from-file", format!("WDL={}", wdl.display()))
        .flag("--inputs-from-file", format!("WORKFLOW_INPUTS={}", inputs_json.display()))
        .flag("--inputs-from-file", format!("WORKFLOW_OPTIONS={}", options_json.display()))
        .flag("--inputs", format!("WORKSPACE={}", join_prefix(&request.out_dir, "workspace")))
        .flag("--inputs", format!("OUTPUTS={}", request.out_dir))
        .merge_stderr()
}


/// Prepares per-sample workflow inputs and submits the GATK workflow.
///
/// # Arguments
///
/// * `runner` - Executes the gcloud command.
/// * `config` - Zones, memory and template prefix, by value.
/// * `request` - Sample input and directories.
///
/// # Returns
/// The operation ID, or an empty string when gcloud printed none.
pub async fn submit_workflow<R: CommandRunner>(
    runner: &R,
    config: GenomicsConfig,
    request: &WorkflowRequest,
) -> Result<String, PipelineError> {
    request.validate()?;

    let sample = request.sample().to_string();
    let sample_dir = request.script_dir.join(&sample);
    ensure_dir(&sample_dir);

    copy_templates(&request.gatk_dir, &config.prefix, &sample, &sample_dir)?;

    let template_json = request
        .gatk_dir
        .join(format!("{}.{}", config.prefix, GATK_INPUTS_SUFFIX));
    let template = fs::read_to_string(&template_json)?;
    let inputs_json = sample_dir.join(format!("{}.{}", sample, GATK_INPUTS_SUFFIX));
    fs::write(&inputs_json, patch_inputs(&template, &sample, &request.input)?)?;
    let options_json = sample_dir.join(format!("{}.{}", sample, GATK_OPTIONS_SUFFIX));

    let logging = request
        .logging
        .clone()
        .unwrap_or_else(|| join_prefix(&request.out_dir, "logs"));
    let command = build_gcloud_command(&config, request, &inputs_json, &options_json, &logging);
    let output = runner.run(&command).await?;

    let job_id = extract_job_id(&output);
    write_sidecar(&sidecar_path(&sample_dir, PROC_SUFFIX), &status_command(&job_id))?;
    write_sidecar(&sidecar_path(&sample_dir, RAW_OUT_SUFFIX), &output)?;
    info!("Submitted GATK workflow for {}: operation {:?}", sample, job_id);

    Ok(job_id)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::tempdir;

    struct Canned {
        reply: String,
        calls: RefCell<Vec<JobCommand>>,
    }

    impl CommandRunner for Canned {
        async fn run(&self, command: &JobCommand) -> Result<String, PipelineError> {
            self.calls.borrow_mut().push(command.clone());
            Ok(self.reply.clone())
        }
    }

    const INPUTS: &str = r#"{"PairedEndSingleSampleWorkflow.sample_name":"NA12878","PairedEndSingleSampleWorkflow.base_file_name":"NA12878","PairedEndSingleSampleWorkflow.ref_fasta":"gs://ref/hg38.fa","PairedEndSingleSampleWorkflow.flowcell_unmapped_bams":["gs://old.bam"],"PairedEndSingleSampleWorkflow.final_gvcf_base_name":"NA12878","PairedEndSingleSampleWorkflow.fingerprint_genotypes_file":"gs://fp.vcf"}"#;

    fn gatk_fixture(root: &Path) -> std::io::Result<PathBuf> {
        let gatk = root.join("gatk");
        fs::create_dir_all(&gatk)?;
        fs::write(gatk.join("PairedEndSingleSampleWf.hg38.inputs.json"), INPUTS)?;
        fs::write(gatk.join("PairedEndSingleSampleWf.gatk4.0.options.json"), "{}")?;
        fs::write(gatk.join("PairedEndSingleSampleWf.gatk4.0.wdl"), "workflow X {}")?;
        fs::write(gatk.join("README.md"), "not a template")?;
        Ok(gatk)
    }

    #[test]
    fn test_extract_job_id() {
        let text = "Running [projects/my-proj/operations/EK2Bo9vXLBjV5Z3x].\n";
        assert_eq!(extract_job_id(text), "EK2Bo9vXLBjV5Z3x");
        assert_eq!(extract_job_id("ERROR: nothing submitted"), "");
    }

    #[test]
    fn test_patch_inputs_keeps_order() -> anyhow::Result<()> {
        let patched = patch_inputs(INPUTS, "sample1", "gs://in/sample1.unmapped.bam")?;
        let data: Map<String, Value> = serde_json::from_str(&patched)?;
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(keys[0], "PairedEndSingleSampleWorkflow.sample_name");
        assert_eq!(keys[2], "PairedEndSingleSampleWorkflow.ref_fasta");
        assert_eq!(data["PairedEndSingleSampleWorkflow.sample_name"], "sample1");
        assert_eq!(data["PairedEndSingleSampleWorkflow.final_gvcf_base_name"], "sample1");
        assert_eq!(data["PairedEndSingleSampleWorkflow.fingerprint_genotypes_file"], "");
        assert_eq!(
            data["PairedEndSingleSampleWorkflow.flowcell_unmapped_bams"],
            serde_json::json!(["gs://in/sample1.unmapped.bam"])
        );
        assert_eq!(data["PairedEndSingleSampleWorkflow.ref_fasta"], "gs://ref/hg38.fa");
        Ok(())
    }

    #[test]
    fn test_copy_templates_renames_per_sample() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let gatk = gatk_fixture(dir.path())?;
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest)?;

        let copied = copy_templates(&gatk, "PairedEndSingleSampleWf", "sample1", &dest)?;
        let names: Vec<String> = copied
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["sample1.gatk4.0.options.json", "sample1.gatk4.0.wdl", "sample1.hg38.inputs.json"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_workflow() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let gatk = gatk_fixture(dir.path())?;
        let scripts = dir.path().join("scripts");
        let runner = Canned {
            reply: "Running [operations/ENyR7cT4LBj].".to_string(),
            calls: RefCell::new(Vec::new()),
        };
        let request = WorkflowRequest {
            input: "gs://ubam/sample1.unmapped.bam".to_string(),
            script_dir: scripts.clone(),
            gatk_dir: gatk.clone(),
            out_dir: "gs://gatk-out/sample1".to_string(),
            wdl_dir: PathBuf::from("/opt/wdl"),
            logging: None,
        };

        let job_id = submit_workflow(&runner, GenomicsConfig::default(), &request).await?;
        assert_eq!(job_id, "ENyR7cT4LBj");

        let calls = runner.calls.borrow();
        let cmd = &calls[0];
        assert_eq!(cmd.program, "gcloud");
        assert_eq!(&cmd.args[..4], &["alpha", "genomics", "pipelines", "run"]);
        assert_eq!(cmd.value_of("--zones"), Some("us-central1-f"));
        assert_eq!(cmd.value_of("--memory"), Some("5"));
        assert_eq!(cmd.value_of("--logging"), Some("gs://gatk-out/sample1/logs"));
        assert_eq!(
            cmd.value_of("--pipeline-file"),
            Some("/opt/wdl/runners/cromwell_on_google/wdl_runner/wdl_pipeline.yaml")
        );
        assert!(cmd.args.contains(&"WORKSPACE=gs://gatk-out/sample1/workspace".to_string()));
        assert!(cmd.args.contains(&"OUTPUTS=gs://gatk-out/sample1".to_string()));
        assert!(cmd.merge_stderr);

        let inputs = fs::read_to_string(scripts.join("sample1/sample1.hg38.inputs.json"))?;
        assert!(inputs.contains("\"PairedEndSingleSampleWorkflow.sample_name\":\"sample1\""));
        let proc_txt = fs::read_to_string(scripts.join("sample1.proc.txt"))?;
        assert_eq!(
            proc_txt,
            "gcloud alpha genomics operations describe ENyR7cT4LBj --format='yaml(done, error, metadata.events)'"
        );
        assert!(scripts.join("sample1.out.txt").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_workflow_requires_gatk_dir() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let scripts = dir.path().join("scripts");
        let runner = Canned { reply: String::new(), calls: RefCell::new(Vec::new()) };
        let request = WorkflowRequest {
            input: "gs://ubam/sample1.bam".to_string(),
            script_dir: scripts.clone(),
            out_dir: "gs://o".to_string(),
            wdl_dir: PathBuf::from("/opt/wdl"),
            ..Default::default()
        };
        let err = submit_workflow(&runner, GenomicsConfig::default(), &request).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingParameter { .. }));
        assert!(runner.calls.borrow().is_empty());
        assert!(!scripts.exists());
        assert_eq!(fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }
}
