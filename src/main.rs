//! Falkor Bundler - opinionated ES module bundler front-end
//!
//! Derives the bundler configuration from `package.json`, `tsconfig.json`
//! and the command line, then hands it to the bundling backend to produce a
//! library, a binary or a shared module.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use falkor_bundler::Cli;

/// Initialize the logging/tracing system
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("falkor_bundler=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_or_exit();

    init_tracing();

    cli.execute().await
}
