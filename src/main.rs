use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use wardrobe_jobs::{
    app_state::AppState,
    config::AppConfig,
    models::job::{Job, JobStatus, JobType},
    orchestrator::{JobOrchestrator, OrchestratorError, ResolveHandle},
    services::{credentials::Credentials, poller::PollOptions},
    telemetry,
};

#[derive(Parser)]
#[command(name = "wardrobe-jobs", about = "Submit and await wardrobe generation jobs")]
struct Cli {
    /// Override the environment's poll attempt budget
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Override the initial poll interval in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Tag attached to log lines
    #[arg(long, global = true)]
    tag: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a job, trigger it, and wait for the result
    Submit {
        #[arg(long)]
        owner: String,

        #[arg(long, value_parser = JobType::from_str)]
        job_type: JobType,

        /// JSON object passed through to the generator
        #[arg(long, default_value = "{}")]
        input: String,
    },
    /// Wait for an existing job
    Wait { job_id: Uuid },
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_tracing();
    telemetry::describe_metrics();

    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration from environment");
            return ExitCode::from(2);
        }
    };

    let credentials = Credentials::new(config.access_token.clone());
    let state = match AppState::from_config(&config, credentials) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize job orchestration");
            return ExitCode::from(2);
        }
    };
    let orchestrator = JobOrchestrator::new(state);

    let handle = match cli.command {
        Command::Submit {
            owner,
            job_type,
            input,
        } => {
            let input = match serde_json::from_str(&input) {
                Ok(input) => input,
                Err(e) => {
                    tracing::error!(error = %e, "Job input is not valid JSON");
                    return ExitCode::from(2);
                }
            };
            match orchestrator.create_and_run(&owner, job_type, input).await {
                Ok((_, handle)) => handle,
                Err(e) => {
                    tracing::error!(error = %e, "Job submission failed");
                    return ExitCode::from(2);
                }
            }
        }
        Command::Wait { job_id } => orchestrator.resolve(job_id),
    };

    let handle = apply_overrides(handle, cli.max_attempts, cli.interval_ms, cli.tag);
    tracing::info!(job_id = %handle.job_id(), "Waiting for job");

    let cancel = handle.cancellation_token();
    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        _ = shutdown_signal(cancel.clone()) => {
            tracing::info!("Interrupted, stopped polling");
            return ExitCode::from(2);
        }
    };

    report(outcome)
}

fn apply_overrides(
    handle: ResolveHandle,
    max_attempts: Option<u32>,
    interval_ms: Option<u64>,
    tag: Option<String>,
) -> ResolveHandle {
    let mut options: PollOptions = handle.options().clone();
    if let Some(attempts) = max_attempts {
        options.max_attempts = attempts;
    }
    if let Some(ms) = interval_ms {
        options.initial_interval = std::time::Duration::from_millis(ms);
    }
    if tag.is_some() {
        options.trace_tag = tag;
    }
    handle.with_options(options)
}

async fn shutdown_signal(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        cancel.cancel();
    } else {
        std::future::pending::<()>().await;
    }
}

fn report(outcome: Result<Job, OrchestratorError>) -> ExitCode {
    match outcome {
        Ok(job) if job.status == JobStatus::Succeeded => {
            let result = job.result.unwrap_or(serde_json::Value::Null);
            println!("{result}");
            ExitCode::SUCCESS
        }
        Ok(job) => {
            eprintln!(
                "generation failed: {}",
                job.error.as_deref().unwrap_or("no error message recorded")
            );
            ExitCode::from(1)
        }
        Err(e) if e.is_timeout() => {
            eprintln!("this is taking longer than expected, check back later: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}
