use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Stampa binary.
#[derive(Debug, Parser)]
#[command(name = "stampa", version, about = "Stampa HTML to PDF server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "STAMPA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the Stampa HTTP service.
    Serve(Box<ServeArgs>),
    /// Run a single retention pass over the output directory and exit.
    Prune(PruneArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct OutputOverrides {
    /// Override the directory generated PDFs are written to.
    #[arg(long = "output-directory", value_name = "PATH")]
    pub directory: Option<PathBuf>,

    /// Override how many of the newest PDFs are retained.
    #[arg(long = "output-keep-count", value_name = "COUNT")]
    pub keep_count: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the Chrome/Chromium executable used for rendering.
    #[arg(long = "render-chrome-path", value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Toggle the Chromium sandbox.
    #[arg(
        long = "render-sandbox",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub sandbox: Option<bool>,

    /// Override how long an idle browser connection is kept before it is dropped.
    #[arg(long = "render-idle-timeout-seconds", value_name = "SECONDS")]
    pub idle_timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub output: OutputOverrides,

    #[command(flatten)]
    pub render: RenderOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the maximum accepted request body in bytes.
    #[arg(long = "server-max-request-bytes", value_name = "BYTES")]
    pub server_max_request_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle whether renderer failure details are returned to API callers.
    #[arg(
        long = "api-expose-render-errors",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub api_expose_render_errors: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PruneArgs {
    #[command(flatten)]
    pub output: OutputOverrides,
}
