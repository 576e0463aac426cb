use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::dispatcher::DispatchResult;
use crate::handlers::HtmlFallback;
use crate::manifest::RouteManifest;
use crate::message::Request;
use crate::middleware::{AuthMiddleware, CorsMiddleware, MetricsMiddleware, TracingMiddleware};
use crate::registry::Registry;
use crate::App;

/// Command-line interface for waypoint route manifests
#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Inspect and exercise waypoint route manifests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the rules a manifest registers
    Routes {
        /// Route manifest (YAML, TOML or JSON)
        #[arg(short, long, env = "WAYPOINT_MANIFEST")]
        manifest: PathBuf,
    },
    /// Dispatch one request against a manifest
    Resolve {
        /// Route manifest (YAML, TOML or JSON)
        #[arg(short, long, env = "WAYPOINT_MANIFEST")]
        manifest: PathBuf,

        /// Request method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request target, optionally with a query string
        #[arg(short, long)]
        path: String,

        /// Request header as `name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,

        /// Run the full pipeline and print the response
        #[arg(long, default_value_t = false)]
        run: bool,
    },
}

/// Registry used by the CLI: echo handlers for every handler name, plus the
/// stock middleware under `tracing`, `metrics`, `cors` and (when
/// `WAYPOINT_AUTH_TOKEN` is set) `auth`.
#[must_use]
pub fn stock_registry() -> Registry {
    let mut registry = Registry::new().echo_unknown(true);
    registry
        .register_middleware("tracing", || TracingMiddleware)
        .register_middleware("metrics", MetricsMiddleware::new)
        .register_middleware("cors", CorsMiddleware::default);
    if let Ok(token) = std::env::var("WAYPOINT_AUTH_TOKEN") {
        registry.register_middleware("auth", move || AuthMiddleware::new(token.clone()));
    }
    registry
}

fn load_app(manifest: &Path) -> Result<App> {
    let manifest_doc = RouteManifest::load(manifest)?;
    let mut router = manifest_doc
        .into_router(stock_registry())
        .with_context(|| format!("Failed to register routes from {}", manifest.display()))?;
    router
        .set_not_found_handler(HtmlFallback::not_found())
        .set_method_not_allowed_handler(HtmlFallback::method_not_allowed());
    Ok(router.build())
}

/// Run a parsed command, writing its output to stdout.
///
/// # Errors
///
/// Fails when the manifest cannot be loaded or registered, or a request
/// header is malformed; with `--run`, also when the pipeline fails.
pub fn run_cli(cli: &Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_writer(cli, &mut out)
}

/// [`run_cli`] with an explicit output sink.
///
/// # Errors
///
/// See [`run_cli`].
pub fn run_with_writer(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Routes { manifest } => {
            let app = load_app(manifest)?;
            for rule in app.rules() {
                writeln!(out, "{rule}")?;
            }
            Ok(())
        }
        Commands::Resolve {
            manifest,
            method,
            path,
            headers,
            body,
            run,
        } => {
            let app = load_app(manifest)?;
            let mut req = Request::new(method.as_str(), path);
            for header in headers {
                let Some((name, value)) = header.split_once(':') else {
                    bail!("Malformed header '{header}', expected 'name: value'");
                };
                req = req.with_header(name.trim(), value.trim());
            }
            if let Some(body) = body {
                req = req.with_body(body.as_bytes());
            }

            if *run {
                let res = app.dispatch(req)?;
                writeln!(out, "HTTP {} {}", res.status, res.reason().unwrap_or(""))?;
                for (name, value) in &res.headers {
                    writeln!(out, "{name}: {value}")?;
                }
                writeln!(out)?;
                writeln!(out, "{}", res.body_string())?;
            } else {
                print_result(out, &app.resolve(req.method(), req.path()))?;
            }
            Ok(())
        }
    }
}

fn print_result(out: &mut dyn Write, result: &DispatchResult) -> io::Result<()> {
    match result {
        DispatchResult::Found { rule, params } => {
            writeln!(out, "{} {rule}", result.status())?;
            for (name, value) in params.iter() {
                writeln!(out, "  {name} = {value}")?;
            }
        }
        DispatchResult::MethodNotAllowed { allowed } => {
            let allowed: Vec<&str> = allowed.iter().map(http::Method::as_str).collect();
            writeln!(out, "{} allowed={}", result.status(), allowed.join(", "))?;
        }
        DispatchResult::NotFound => writeln!(out, "{}", result.status())?,
    }
    Ok(())
}
