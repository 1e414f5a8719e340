use super::export::{run_export, ExportArgs};
use crate::output::Output;
use color_eyre::Result;
use std::time::Duration;
use tracing::{error, info};
use vod_export_config::config::default_scheduler_config;
use vod_export_config::PathManager;

/// Foreground scheduler loop: export on a fixed interval until the process
/// is terminated. Intended to run under a supervisor (systemd, container
/// runtime) which owns daemonization and restarts.
pub async fn run_daemon(
    interval: Option<u64>,
    no_startup_run: bool,
    output: &Output,
) -> Result<()> {
    let (_paths, config, _creds) = super::load_setup()?;

    let scheduler = config
        .scheduler
        .clone()
        .unwrap_or_else(default_scheduler_config);
    let interval_minutes = interval.unwrap_or(scheduler.interval_minutes).max(1);

    output.info(format!(
        "Daemon started, exporting every {} minute(s). Logs: {}",
        interval_minutes,
        PathManager::default().daemon_log_file().display()
    ));

    if scheduler.run_on_startup && !no_startup_run {
        run_cycle(output).await;
    } else {
        info!("Startup run skipped, first export in {} minute(s)", interval_minutes);
    }

    loop {
        tokio::time::sleep(Duration::from_secs(interval_minutes * 60)).await;
        run_cycle(output).await;
    }
}

/// One scheduled export. Failures are logged and the loop keeps going; a
/// transient API outage should not kill the daemon.
async fn run_cycle(output: &Output) {
    info!("Starting scheduled export run");
    let args = ExportArgs {
        movies: false,
        series: false,
        refresh: true,
        delete_old: false,
        accounts: None,
    };
    match run_export(args, output).await {
        Ok(()) => info!("Scheduled export run finished"),
        Err(e) => error!("Scheduled export run failed: {:#}", e),
    }
}
