//! # FixHive CLI (`fixhive`)
//!
//! ## Usage
//!
//! ```bash
//! fixhive [--config fixhive.toml] <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fixhive serve stdio` | MCP server on stdin/stdout (what MCP clients launch) |
//! | `fixhive serve http` | JSON HTTP tool server on `[server].bind` |
//! | `fixhive hook post-tool` | Inspect a tool result on stdin for error output |
//! | `fixhive tools` | Print the tool descriptors as JSON |
//! | `fixhive config` | Print the effective configuration, key masked |
//!
//! Without a config file, everything comes from `FIXHIVE_*` environment
//! variables. Cloud mode needs both `FIXHIVE_SUPABASE_URL` and
//! `FIXHIVE_SUPABASE_KEY`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fixhive::config::{shared_config, LogLevel};
use fixhive::logging::init_logging;
use fixhive::tools::ToolContext;
use fixhive::{hook, mcp, server};

#[derive(Parser)]
#[command(
    name = "fixhive",
    about = "FixHive: a shared error-solution knowledge base for coding assistants",
    version
)]
struct Cli {
    /// Path to an optional TOML configuration file.
    ///
    /// Environment variables override values from the file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a tool server.
    Serve {
        #[command(subcommand)]
        transport: Transport,
    },

    /// Assistant-host hooks.
    Hook {
        #[command(subcommand)]
        event: HookEvent,
    },

    /// Print the tool descriptors as JSON.
    Tools,

    /// Print the effective configuration with the access key masked.
    Config,
}

#[derive(Subcommand)]
enum Transport {
    /// MCP over stdin/stdout.
    Stdio,
    /// JSON over HTTP.
    Http,
}

#[derive(Subcommand)]
enum HookEvent {
    /// Runs after each tool call; reads `{tool_name, tool_output}` on stdin.
    PostTool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require a valid config
    match &cli.command {
        Commands::Hook {
            event: HookEvent::PostTool,
        } => {
            let level = shared_config(cli.config.as_deref())
                .map(|cfg| cfg.log.level)
                .unwrap_or(LogLevel::Warn);
            init_logging(level);
            return hook::run(std::io::stdin().lock(), std::io::stdout().lock());
        }
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&server::tool_infos())?);
            return Ok(());
        }
        _ => {}
    }

    let cfg = shared_config(cli.config.as_deref())?;
    init_logging(cfg.log.level);

    match cli.command {
        Commands::Serve { transport } => {
            let ctx = ToolContext::from_config(cfg)?;
            match transport {
                Transport::Stdio => mcp::serve_stdio(ctx).await?,
                Transport::Http => server::run_server(ctx).await?,
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&cfg.masked_summary())?);
        }
        Commands::Hook { .. } | Commands::Tools => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
