use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ringline_core::Config;
use ringline_mcp::{Dispatcher, McpServer, ToolName};
use ringline_vonage::VonageGateway;

mod csv_cmd;
mod tool_cmd;

#[derive(Parser)]
#[command(name = "ringline", about = "Ringline - SMS and voice call tools over MCP")]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Provider settings. Each flag falls back to its environment variable.
#[derive(Args)]
struct ProviderArgs {
    /// Vonage application id
    #[arg(long, global = true, env = "VONAGE_APPLICATION_ID")]
    application_id: Option<String>,

    /// Path to the application's private key (PEM)
    #[arg(long, global = true, env = "VONAGE_PRIVATE_KEY_PATH")]
    private_key_path: Option<PathBuf>,

    /// Origin number for voice calls
    #[arg(long, global = true, env = "VONAGE_VOICE_FROM")]
    voice_from: Option<String>,

    /// Country code applied to local numbers starting with 0
    #[arg(long, global = true, env = "RINGLINE_COUNTRY_CODE")]
    country_code: Option<String>,

    /// Provider API base URL
    #[arg(long, global = true, env = "VONAGE_API_URL")]
    api_url: Option<String>,
}

impl ProviderArgs {
    fn config(&self) -> Config {
        Config::from_lookup(|key| {
            let flag = match key {
                "VONAGE_APPLICATION_ID" => self.application_id.clone(),
                "VONAGE_PRIVATE_KEY_PATH" => self
                    .private_key_path
                    .as_ref()
                    .map(|p| p.display().to_string()),
                "VONAGE_VOICE_FROM" => self.voice_from.clone(),
                "RINGLINE_COUNTRY_CODE" => self.country_code.clone(),
                "VONAGE_API_URL" => self.api_url.clone(),
                _ => None,
            };
            flag.or_else(|| std::env::var(key).ok())
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (for Claude Desktop and similar clients)
    Stdio,

    /// Validate a bulk SMS CSV file without sending anything
    CheckCsv {
        /// CSV file with a phone,from,message header
        file: PathBuf,
    },

    /// Show the status of a voice call
    CallStatus {
        /// Call UUID
        call_id: String,
    },

    /// Generate a client JWT
    Token {
        /// Lifetime in seconds
        #[arg(long)]
        expires_in: Option<u64>,

        /// Token subject
        #[arg(long)]
        subject: Option<String>,
    },

    /// Send a single SMS
    SendSms {
        /// Destination phone number
        #[arg(long)]
        to: String,

        /// Message text
        #[arg(long)]
        message: String,

        /// Alphanumeric sender name
        #[arg(long)]
        from: Option<String>,
    },
}

fn dispatcher(config: Config) -> anyhow::Result<Dispatcher> {
    let config = Arc::new(config);
    let gateway = VonageGateway::new(config.clone())?;
    Ok(Dispatcher::new(config, Arc::new(gateway)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries protocol frames in stdio mode; logs always go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.provider.config();

    match cli.command {
        Commands::Stdio => {
            tracing::info!("serving MCP on stdio");
            let server = McpServer::new(dispatcher(config)?);
            ringline_mcp::stdio::serve_stdio(&server).await?;
        }
        Commands::CheckCsv { file } => {
            csv_cmd::run(&config, &file)?;
        }
        Commands::CallStatus { call_id } => {
            tool_cmd::run(
                &dispatcher(config)?,
                ToolName::GetCallStatus,
                serde_json::json!({ "call_id": call_id }),
            )
            .await?;
        }
        Commands::Token {
            expires_in,
            subject,
        } => {
            tool_cmd::run(
                &dispatcher(config)?,
                ToolName::GenerateJwt,
                serde_json::json!({ "expires_in": expires_in, "subject": subject }),
            )
            .await?;
        }
        Commands::SendSms { to, message, from } => {
            tool_cmd::run(
                &dispatcher(config)?,
                ToolName::SendSms,
                serde_json::json!({ "to": to, "message": message, "from": from }),
            )
            .await?;
        }
    }

    Ok(())
}
