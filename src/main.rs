use clap::{Parser, Subcommand};
use sim_mcp::errors::SettingsError;
use sim_mcp::mcp::catalog::list_tools;
use sim_mcp::services::logger::LogLevel;
use sim_mcp::services::settings::Settings;

/// MCP server exposing the simulation platform API as tools.
#[derive(Parser)]
#[command(name = "sim-mcp", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Platform base URL (overrides SIM_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in milliseconds (overrides SIM_TIMEOUT_MS)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// error, warn, info or debug (overrides SIM_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve MCP over stdio (default)
    Serve,
    /// Print the tool catalog as JSON
    Tools,
}

fn resolve_settings(cli: &Cli) -> Result<Settings, SettingsError> {
    let mut settings = Settings::from_env()?;
    if let Some(url) = &cli.base_url {
        settings = settings.with_base_url(url)?;
    }
    if let Some(millis) = cli.timeout_ms {
        settings = settings.with_request_timeout_ms(millis)?;
    }
    if let Some(raw) = &cli.log_level {
        let level = raw
            .parse::<LogLevel>()
            .map_err(|_| SettingsError::InvalidLogLevel {
                key: "--log-level",
                value: raw.clone(),
            })?;
        settings = settings.with_log_level(level);
    }
    Ok(settings)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::Tools)) {
        match serde_json::to_string_pretty(&list_tools()) {
            Ok(text) => println!("{}", text),
            Err(err) => {
                eprintln!("sim-mcp: {}", err);
                std::process::exit(1);
            }
        }
        return;
    }

    let settings = match resolve_settings(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("sim-mcp: {}", err);
            std::process::exit(2);
        }
    };

    if let Err(err) = sim_mcp::mcp::server::run_stdio(settings).await {
        eprintln!("sim-mcp: {}", err);
        std::process::exit(1);
    }
}
