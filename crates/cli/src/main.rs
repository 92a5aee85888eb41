mod server;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use codemap_protocol::{ErrorEnvelope, ErrorKind};
use codemap_structure::ParseLimits;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "codemap",
    version,
    about = "Source structure and call-graph analysis with line-range patching"
)]
struct Cli {
    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one Python file and print its outline as JSON
    Analyze(AnalyzeArgs),

    /// Serve the analysis and patch API over HTTP
    Serve(ServeArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to the Python source file
    file: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    #[command(flatten)]
    limits: LimitArgs,
}

#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:7878")]
    pub(crate) bind: String,

    /// Spool directory for persisted sources
    #[arg(long, env = "CODEMAP_SPOOL_DIR")]
    pub(crate) spool: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) limits: LimitArgs,
}

#[derive(Args, Clone, Copy)]
pub(crate) struct LimitArgs {
    /// Maximum accepted source size in bytes
    #[arg(long, default_value_t = ParseLimits::default().max_source_bytes)]
    max_source_bytes: usize,

    /// Parse wall-clock bound in milliseconds (0 disables the bound)
    #[arg(long, default_value_t = ParseLimits::default().parse_timeout_ms)]
    parse_timeout_ms: u64,
}

impl LimitArgs {
    pub(crate) fn to_limits(self) -> ParseLimits {
        ParseLimits {
            max_source_bytes: self.max_source_bytes,
            parse_timeout_ms: self.parse_timeout_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::Serve(args) => server::serve(args).await,
    }
}

fn init_logging(quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let file_id = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let request = codemap_protocol::AnalyzeRequest { file_id, source };
    let envelope = match request.validate() {
        Err(message) => ErrorEnvelope::new(ErrorKind::InvalidRequest, message),
        Ok(()) => match codemap_graph::analyze(&request.source, args.limits.to_limits()) {
            Ok(outline) => {
                print_json(&outline, args.pretty)?;
                return Ok(());
            }
            Err(err) => server::analysis_failure(&err),
        },
    };

    print_json(&envelope, args.pretty)?;
    std::process::exit(1);
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
