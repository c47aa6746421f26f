use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use renova_proxy::{logging, AppState, HttpUpstream, ProxyConfig};
use renova_resolver::{resolve, ImageReference};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file")
}

/// Options accepted by `serve`, also taken at top level when no subcommand is given
fn serve_args() -> Vec<Arg> {
    vec![
        config_arg(),
        Arg::new("bind")
            .long("bind")
            .env("RENOVA_BIND")
            .value_parser(value_parser!(SocketAddr))
            .help("Listen address"),
        Arg::new("upstream")
            .long("upstream")
            .env("RENOVA_UPSTREAM")
            .value_parser(|raw: &str| Url::parse(raw))
            .help("Image origin base URL"),
        Arg::new("projects-upstream")
            .long("projects-upstream")
            .env("RENOVA_PROJECTS_UPSTREAM")
            .value_parser(|raw: &str| Url::parse(raw))
            .help("Project data backend base URL"),
        Arg::new("admin-token")
            .long("admin-token")
            .env("RENOVA_ADMIN_TOKEN")
            .hide_env_values(true)
            .help("Bearer token required by /api/admin/ routes"),
        Arg::new("placeholder")
            .long("placeholder")
            .value_parser(value_parser!(PathBuf))
            .help("File served at /placeholder.jpg"),
        Arg::new("no-transport-fallback")
            .long("no-transport-fallback")
            .action(ArgAction::SetTrue)
            .help("Fail immediately when an upstream is unreachable"),
        Arg::new("timeout")
            .long("timeout")
            .value_parser(value_parser!(u64))
            .help("Upstream request timeout in seconds"),
        Arg::new("log")
            .long("log")
            .env("RENOVA_LOG")
            .help("Log filter directive"),
        Arg::new("log-json")
            .long("log-json")
            .action(ArgAction::SetTrue)
            .help("Emit JSON log lines"),
    ]
}

fn cli() -> Command {
    Command::new("renova-proxy")
        .version(renova_proxy::VERSION)
        .about("Renova image proxy and project feed")
        .args(serve_args())
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP server (default)")
                .args(serve_args()),
        )
        .subcommand(
            Command::new("candidates")
                .about("Print the sources tried for an image reference")
                .arg(Arg::new("reference").required(true).help("Image URL, path, or file name"))
                .arg(config_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

/// Matches carrying the serve options: the `serve` subcommand's, or top level
fn serve_matches(matches: &ArgMatches) -> &ArgMatches {
    match matches.subcommand() {
        Some(("serve", args)) => args,
        _ => matches,
    }
}

fn load_config(args: &ArgMatches) -> Result<ProxyConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => ProxyConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ProxyConfig::new()),
    }
}

fn serve_config(args: &ArgMatches) -> Result<ProxyConfig> {
    let mut config = load_config(args)?;
    if let Some(bind) = args.get_one::<SocketAddr>("bind") {
        config = config.with_bind(*bind);
    }
    if let Some(url) = args.get_one::<Url>("upstream") {
        config = config.with_upstream(url.clone());
    }
    if let Some(url) = args.get_one::<Url>("projects-upstream") {
        config = config.with_projects_upstream(url.clone());
    }
    if let Some(token) = args.get_one::<String>("admin-token") {
        config = config.with_admin_token(token.clone());
    }
    if let Some(path) = args.get_one::<PathBuf>("placeholder") {
        config = config.with_placeholder_file(path.clone());
    }
    if args.get_flag("no-transport-fallback") {
        config = config.with_transport_fallback(false);
    }
    if let Some(secs) = args.get_one::<u64>("timeout") {
        config = config.with_timeout_secs(*secs);
    }
    if let Some(filter) = args.get_one::<String>("log") {
        config = config.with_log_filter(filter.clone());
    }
    if args.get_flag("log-json") {
        config = config.with_json_logs(true);
    }
    config.validate()?;
    Ok(config)
}

async fn run_serve(args: &ArgMatches) -> Result<()> {
    let config = serve_config(args)?;
    logging::init(&config.log)?;

    tracing::info!(
        version = renova_proxy::VERSION,
        upstream = %config.upstream_base,
        projects = %config.projects_base,
        subpaths = ?config.upstream_subpaths,
        "starting image proxy"
    );
    if config.admin_token.is_none() {
        tracing::warn!("no admin token configured, /api/admin/ routes will reject every request");
    }

    let upstream = Arc::new(HttpUpstream::new(config.upstream_timeout())?);
    let state = AppState::from_config(&config, upstream)?;
    renova_proxy::routes::serve(state, config.bind, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for shutdown signal");
        }
        tracing::info!("shutdown requested");
    })
    .await
    .with_context(|| format!("binding {}", config.bind))
}

fn render_candidates(args: &ArgMatches) -> Result<String> {
    let config = load_config(args)?;
    let raw = args
        .get_one::<String>("reference")
        .context("missing image reference")?;
    let reference = ImageReference::new(raw.as_str())?;
    let candidates = resolve(&reference, &config.candidates);

    if args.get_flag("json") {
        Ok(serde_json::to_string_pretty(&candidates)?)
    } else {
        Ok(candidates.as_slice().join("\n"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("candidates", args)) => {
            println!("{}", render_candidates(args)?);
            Ok(())
        }
        _ => run_serve(serve_matches(&matches)).await,
    }
}
