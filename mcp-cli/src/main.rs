use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mcp_stream_core::{CallToolResult, HttpStreamConfig, McpClient, McpConfig, ToolInvoker};
use serde_json::{json, Value};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEEPWIKI_ENDPOINT: &str = "https://mcp.deepwiki.com/mcp";

#[derive(Parser, Debug)]
#[command(name = "mcp-stream")]
#[command(about = "Talk to an MCP server over Streamable HTTP")]
#[command(version)]
pub struct Cli {
    /// MCP endpoint URL (overrides the config file)
    #[arg(short, long, global = true)]
    pub url: Option<String>,

    /// Configuration file (.json, .yaml or .toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print raw JSON results
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// List the server's tools
    Tools,
    /// Call a tool with JSON arguments
    Call {
        /// Tool name
        name: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// Ask DeepWiki a question about a GitHub repository
    Ask {
        /// Repository as owner/name
        #[arg(short, long)]
        repo: String,

        /// The question
        #[arg(short, long)]
        question: String,
    },
    /// Show server info and capabilities
    Info,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<McpConfig> {
        let mut config = match &self.config {
            Some(path) => McpConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => McpConfig::new(HttpStreamConfig::from_url(DEEPWIKI_ENDPOINT)?),
        };

        if let Some(url) = &self.url {
            config.server.endpoint = url
                .parse()
                .with_context(|| format!("invalid --url {url}"))?;
        }
        if let Some(secs) = self.timeout {
            config.client.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.resolve_config()?;
    let mut client = McpClient::from_config(config)?;

    let outcome = run(&cli, &mut client).await;

    if let Err(e) = client.disconnect().await {
        warn!(error = %e, "Disconnect failed");
    }
    outcome
}

async fn run(cli: &Cli, client: &mut McpClient) -> Result<()> {
    let init = client.initialize().await.context("initialize failed")?;

    match &cli.command {
        Commands::Info => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&init)?);
                return Ok(());
            }
            let session = client.session();
            match session.server_info() {
                Some(server) => println!("Server:    {} {}", server.name, server.version),
                None => println!("Server:    <unnamed>"),
            }
            println!(
                "Protocol:  {}",
                session.protocol_version().unwrap_or("<unspecified>")
            );
            println!("Endpoint:  {}", session.endpoint());
            if session.has_session_id() {
                println!("Session:   {}", session.session_id());
            }
            println!(
                "Capabilities:\n{}",
                serde_json::to_string_pretty(session.server_capabilities())?
            );
            if let Some(instructions) = session.instructions() {
                println!("Instructions:\n{instructions}");
            }
        }
        Commands::Tools => {
            let tools = client.list_tools().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&tools)?);
            } else if tools.tools.is_empty() {
                println!("(no tools)");
            } else {
                for tool in &tools.tools {
                    println!("{}: {}", tool.name, tool.description);
                }
            }
        }
        Commands::Call { name, args } => {
            let arguments = parse_arguments(args)?;
            let result = client.call_tool(name, arguments).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", CallToolResult::text_or_json(&result));
            }
            if CallToolResult::from_value(&result).is_error() {
                bail!("tool '{name}' reported an error");
            }
        }
        Commands::Ask { repo, question } => {
            let answer = client
                .invoke(
                    "ask_question",
                    json!({"repoName": repo, "question": question}),
                )
                .await?;
            println!("{answer}");
        }
    }

    Ok(())
}

fn parse_arguments(raw: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("--args is not valid JSON: {raw}"))?;
    if !value.is_object() {
        bail!("--args must be a JSON object, got {value}");
    }
    Ok(value)
}
