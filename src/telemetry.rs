use tracing_subscriber::EnvFilter;

/// Initialize structured JSON logging, `info` unless `RUST_LOG` says otherwise.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();
}

/// Register descriptions for the orchestration metrics.
pub fn describe_metrics() {
    metrics::describe_counter!("jobs_created_total", "Total generation jobs created");
    metrics::describe_counter!(
        "job_triggers_failed_total",
        "Execution triggers that were not sent or not acknowledged"
    );
    metrics::describe_counter!("job_poll_reads_total", "Job store reads issued by pollers");
    metrics::describe_counter!(
        "job_poll_timeouts_total",
        "Poll runs that exhausted their attempt budget"
    );
    metrics::describe_counter!(
        "job_circuit_trips_total",
        "Job ids whose circuit opened after consecutive read failures"
    );
    metrics::describe_counter!(
        "job_final_check_hits_total",
        "Poll timeouts rescued by the final check read"
    );
    metrics::describe_histogram!(
        "job_resolve_seconds",
        metrics::Unit::Seconds,
        "Time to resolve a job to a terminal state or error"
    );
}
