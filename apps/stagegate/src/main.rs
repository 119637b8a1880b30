//! # Stagegate
//!
//! Command-line front end for `stagegate-core`.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                apps/stagegate (THE BINARY)            │
//! │                                                       │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────┐   │
//! │  │  Geometry   │  │ Preferences  │  │  Simulate   │   │
//! │  │  commands   │  │   (redb)     │  │   (toml)    │   │
//! │  └──────┬──────┘  └──────┬───────┘  └──────┬──────┘   │
//! │         └────────────────┼─────────────────┘          │
//! │                          ▼                            │
//! │                 ┌─────────────────┐                   │
//! │                 │ stagegate-core  │                   │
//! │                 └─────────────────┘                   │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! stagegate transform --preview 1920x1080 --view 1080x1920
//! stagegate rotation --sensor 90 --facing front --screen 90
//! stagegate prefs list
//! stagegate simulate --script capture.toml
//! ```

use clap::Parser;
use stagegate::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // STAGEGATE_LOG_FORMAT=json enables machine-parseable logs.
    let log_format = std::env::var("STAGEGATE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "stagegate=debug,stagegate_core=debug"
    } else {
        "stagegate=info,stagegate_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so command output on stdout stays parseable.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  stagegate v{}
  stage-ordered capture flow
"#,
        env!("CARGO_PKG_VERSION")
    );
}
