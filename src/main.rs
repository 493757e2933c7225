//! multi-lookup - Parallel batch hostname resolver
//!
//! Entry point for the CLI application.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use multi_lookup::config::{CliArgs, LookupConfig};
use multi_lookup::error::{exit_code, LookupError};
use multi_lookup::lookup::Coordinator;
use multi_lookup::progress::{print_header, print_summary, ProgressReporter};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version also land here
            let code = if e.use_stderr() { exit_code::ARGS } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn run(args: CliArgs) -> Result<()> {
    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = LookupConfig::from_args(args)
        .map_err(LookupError::from)
        .context("Invalid configuration")?;

    // Print header
    if config.show_progress {
        print_header(
            config.inputs.len(),
            config.resolver_count,
            config.queue_size,
            &config.output_path,
        );
    }

    let output_path = config.output_path.clone();
    let show_progress = config.show_progress;

    // Create coordinator
    let coordinator = Coordinator::new(config).context("Failed to initialize lookup")?;

    // Setup signal handler for graceful shutdown
    let shutdown = coordinator.shutdown_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown.trigger();
    })
    .context("Failed to set signal handler")?;

    // Run the lookup
    let result = if show_progress {
        let progress = ProgressReporter::new();
        progress.set_status("Starting...");

        let reporter = progress.clone();
        let result = coordinator
            .run_with_progress(move |p| reporter.update(&p))
            .context("Lookup failed");

        match &result {
            Ok(r) if r.completed => progress.finish("Lookup completed"),
            Ok(_) => progress.finish("Lookup interrupted"),
            Err(_) => progress.finish_and_clear(),
        }
        result?
    } else {
        coordinator.run().context("Lookup failed")?
    };

    // Print summary
    if show_progress {
        print_summary(&result, &output_path);
    }

    if result.no_readable_input() {
        return Err(LookupError::NoReadableInput {
            attempted: result.requesters,
        }
        .into());
    }

    if !result.completed {
        info!("Lookup was interrupted before completion");
        return Err(LookupError::Interrupted.into());
    }

    if result.inputs_failed > 0 || result.failed > 0 {
        info!(
            inputs_failed = result.inputs_failed,
            unresolved = result.failed,
            "Lookup completed with errors"
        );
    }

    Ok(())
}

/// Map an error chain to the process exit code
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<LookupError>())
        .map(LookupError::exit_code)
        .unwrap_or(exit_code::OTHER)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("multi_lookup=debug,warn")
    } else {
        EnvFilter::new("multi_lookup=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
