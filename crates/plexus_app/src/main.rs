// SPDX-License-Identifier: MIT OR Apache-2.0
//! `plexus` - processor network command-line driver
//!
//! Loads a persisted processor network, reports what was restored and which
//! processors need recomputation, and optionally writes the network back out
//! in another format.

mod cli;
mod error;
mod settings;

use cli::{Args, USAGE};
use error::AppError;
use plexus_network::{InvalidationLevel, Network, Runtime};
use settings::AppSettings;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return;
    }

    // Settings come first so their filter can seed the subscriber
    let (settings, settings_error) = match AppSettings::load_or_default(&args.config) {
        Ok(settings) => (settings, None),
        Err(e) => (AppSettings::default(), Some(e)),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting plexus v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = settings_error {
        tracing::warn!("Ignoring {}: {e}", args.config.display());
    }

    if let Err(e) = run(&args, &settings) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args, settings: &AppSettings) -> Result<(), AppError> {
    let runtime = Runtime::init().into_shared();

    let Some(path) = args.network.as_ref().or(settings.network.as_ref()) else {
        println!("Registered processor types:");
        for id in runtime.processors().class_identifiers() {
            println!("  {id}");
        }
        return Ok(());
    };

    let (mut network, report) = Network::load_from_path(Arc::clone(&runtime), path)?;

    if settings.invalidate_all_on_load {
        let ids: Vec<_> = network.processor_ids().collect();
        for id in ids {
            network.invalidate(id, InvalidationLevel::InvalidResample);
        }
    }

    print_summary(&network);
    for warning in &report.warnings {
        println!("warning: {warning}");
    }

    if let Some(output) = args.output.as_ref().or(settings.output.as_ref()) {
        network.save_to_path(output)?;
        println!("Saved to {}", output.display());
    }

    Ok(())
}

fn print_summary(network: &Network) {
    println!(
        "{} processors, {} connections, {} links",
        network.processor_count(),
        network.connection_count(),
        network.link_count()
    );

    match network.topological_order() {
        Ok(order) => {
            for id in order {
                if let Some(processor) = network.processor(id) {
                    println!(
                        "  {:<24} {:<32} {}",
                        processor.identifier,
                        processor.class_identifier.as_str(),
                        processor.invalidation_level()
                    );
                }
            }
        }
        Err(e) => println!("  {e}"),
    }

    let pending = network.invalid_processors();
    if !pending.is_empty() {
        println!("{} processor(s) need recomputation", pending.len());
    }
}
