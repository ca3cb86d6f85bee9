use std::path::Path;

use crate::cli::{Cli, Commands};
use space_hunter::config::ScannerConfig;
use space_hunter::output::CLASSIFICATION_CSV;
use space_hunter::scan::{run_classification, run_scan};
use space_hunter::target::Classification;

fn print_ascii_logo() {
    println!(r#"
   ____                        _   _             _
  / ___| _ __   __ _  ___ ___ | | | |_   _ _ __ | |_ ___ _ __
  \___ \| '_ \ / _` |/ __/ _ \| |_| | | | | '_ \| __/ _ \ '__|
   ___) | |_) | (_| | (_|  __/|  _  | |_| | | | | ||  __/ |
  |____/| .__/ \__,_|\___\___||_| |_|\__,_|_| |_|\__\___|_|
        |_|
                  FOFA + Quake asset search v{}
    "#, env!("CARGO_PKG_VERSION"));
}

fn init_logging(debug: bool, verbose: bool) {
    // External crates stay at INFO so the request layer doesn't flood the CLI.
    use tracing_subscriber::EnvFilter;
    let default_level = if debug { "debug" } else if verbose { "info" } else { "warn" };
    let crate_level = std::env::var("SCANNER_LOG_LEVEL")
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default_level.to_string());
    let filter_str = format!(
        "space_hunter={crate},reqwest=info,hyper=info,h2=info",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.debug, cli.verbose);

    match cli.command {
        Commands::Scan { input, out, workers, delay, retries, retry_delay, max_failures, timeout, page_size } => {
            let mut config = ScannerConfig::from_env();
            if let Some(v) = workers {
                config.max_workers = v;
            }
            if let Some(v) = delay {
                config.api_delay = v;
            }
            if let Some(v) = retries {
                config.max_retries = v;
            }
            if let Some(v) = retry_delay {
                config.retry_delay = v;
            }
            if let Some(v) = max_failures {
                config.max_api_failures = v;
            }
            if let Some(v) = timeout {
                config.request_timeout = v;
            }
            if let Some(v) = page_size {
                config.page_size = v;
            }

            tracing::info!(input = %input.display(), out = %out.display(), workers = config.max_workers, "Starting space scanner with {} workers", config.max_workers);

            print_ascii_logo();
            println!("[>] Input: {}", input.display());
            println!("[~] Workers: {} | API delay: {}s | Retries: {}", config.max_workers, config.api_delay, config.max_retries);
            println!("\n{}\n", "-".repeat(60));

            let report = run_scan(config, &input, &out).await?;
            report.print_summary();
        }
        Commands::Classify { input, out } => {
            let records = run_classification(&input, &out)?;
            print_classification(&records, &out);
        }
    }
    Ok(())
}

fn print_classification(records: &[space_hunter::target::ClassificationRecord], out: &Path) {
    let count = |c: Classification| records.iter().filter(|r| r.classification == c).count();
    let expanded: usize = records
        .iter()
        .filter(|r| r.classification != Classification::Unrecognised)
        .map(|r| r.expanded_count)
        .sum();

    println!("\n[*] Classified {} inputs into {} targets", records.len(), expanded);
    for c in [
        Classification::Ip,
        Classification::IpRange,
        Classification::CSegment,
        Classification::Subdomain,
        Classification::Domain,
        Classification::Unrecognised,
    ] {
        let n = count(c);
        if n > 0 {
            println!("   {}: {}", c, n);
        }
    }
    println!("\n[=] Report saved to: {}", out.join(CLASSIFICATION_CSV).display());
}
