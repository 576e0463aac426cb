//! # CLI Module
//!
//! Command-line front end for inspecting and exercising route manifests.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List the rule table a manifest produces, in registration order:
//!
//! ```bash
//! waypoint routes --manifest routes.yaml
//! ```
//!
//! ### `resolve`
//!
//! Dispatch one request against a manifest and print the result:
//!
//! ```bash
//! waypoint resolve --manifest routes.yaml --method GET --path /api/user/42
//! ```
//!
//! With `--run` the request goes through the full middleware pipeline and the
//! response is printed. Handler names the manifest uses are served by echo
//! handlers, which answer with the dispatch inputs as JSON:
//!
//! ```bash
//! waypoint resolve --manifest routes.yaml --method POST --path /api/user \
//!     --header "x-api-key: secret" --body '{"name":"Ann"}' --run
//! ```
//!
//! Named middleware available to manifests: `tracing`, `metrics`, `cors`, and
//! `auth` when `WAYPOINT_AUTH_TOKEN` is set.
//!
//! ## Usage from Code
//!
//! ```rust,no_run
//! use clap::Parser;
//! use waypoint::cli::{run_cli, Cli};
//!
//! let cli = Cli::parse();
//! run_cli(&cli)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, run_with_writer, stock_registry, Cli, Commands};
