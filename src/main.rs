use std::io::Write;
use std::time::Instant;

use anyhow::Result;
use env_logger::Builder;
use log::{self, LevelFilter, error, info};

use gcloud_bam_pipelines::cli::{parse, Module};
use gcloud_bam_pipelines::config::defs::{DsubConfig, PipelineError, DSUB_TAG, GCLOUD_TAG};
use gcloud_bam_pipelines::pipelines::{cmp_files, dsub_jobs, gen_pipe, input_pairs};
use gcloud_bam_pipelines::utils::command::{require_tool, ProcessRunner};


#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    if let Err(e) = run_module(args.module).await {
        error!("Run failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
        std::process::exit(1);
    }

    info!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}


async fn run_module(module: Module) -> Result<(), PipelineError> {
    let runner = ProcessRunner;
    let config = DsubConfig::default();

    match module {
        Module::InputPairs(args) => {
            input_pairs::run(&args)?;
        }
        Module::BuildBamIndex(args) => {
            require_tool(DSUB_TAG)?;
            dsub_jobs::run_index(&args, &config, &runner).await?;
        }
        Module::Submit(args) => {
            require_tool(DSUB_TAG)?;
            dsub_jobs::run_step(&args, &config, &runner).await?;
        }
        Module::CmpFiles(args) => {
            cmp_files::run(&args)?;
        }
        Module::GenPipe(args) => {
            require_tool(GCLOUD_TAG)?;
            let jobs = gen_pipe::run(&args, &runner).await?;
            info!("Submitted {} workflows; status commands are in {}", jobs.len(), args.script);
        }
    }
    Ok(())
}
