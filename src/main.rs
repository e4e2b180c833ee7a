//
//  bitbucket-ingest
//  main.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bitbucket_ingest::api::ApiError;
use bitbucket_ingest::cli::{Cli, Commands};
use bitbucket_ingest::exit_codes;

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_code(&e));
        }
    }
}

/// Initialize logging based on environment
fn init_logging() {
    let filter = EnvFilter::try_from_env("BB_INGEST_DEBUG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Maps an error to the exit code scripts can check.
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.chain().find_map(|cause| cause.downcast_ref::<ApiError>()) {
        Some(ApiError::Authentication { .. }) => exit_codes::AUTH_ERROR,
        Some(ApiError::ResourceNotFound(_)) => exit_codes::NOT_FOUND,
        Some(ApiError::RetriesExceeded { .. } | ApiError::CredentialsExhausted(_)) => {
            exit_codes::RATE_LIMIT
        }
        _ => exit_codes::ERROR,
    }
}

/// Main command dispatcher
async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Verify(cmd) => cmd.run(&cli.global).await,
        Commands::Run(cmd) => cmd.run(&cli.global).await,
        Commands::Version => {
            println!("{} version {}", bitbucket_ingest::APP_NAME, bitbucket_ingest::VERSION);
            Ok(())
        }
    }
}
