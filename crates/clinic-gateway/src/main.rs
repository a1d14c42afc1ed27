//! clinic-gateway: Clinic Bot Main Binary
//!
//! Usage:
//!   clinic-gateway            - Start the WhatsApp webhook server
//!   clinic-gateway --help     - Show help
//!   clinic-gateway --version  - Show version

use clinic_core::Config;
use clinic_whatsapp::WhatsAppBot;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Webhook server
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args(std::env::args().skip(1)) {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("clinic-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting clinic-gateway...");

    let bot = WhatsAppBot::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create WhatsApp bot: {}", e))?;

    let mut handle = tokio::spawn(async move {
        if let Err(e) = bot.start().await {
            tracing::error!("Webhook server error: {}", e);
        }
    });

    tracing::info!("Press Ctrl+C to exit");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down...");
            handle.abort();
        }
        result = &mut handle => {
            if let Err(e) = result {
                tracing::error!("Webhook server task failed: {}", e);
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> RunMode
where
    I: IntoIterator<Item = String>,
{
    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("clinic-gateway - WhatsApp appointment booking bot");
    println!();
    println!("Usage:");
    println!("  clinic-gateway            Start the webhook server");
    println!("  clinic-gateway --help     Show this help message");
    println!("  clinic-gateway --version  Show version");
    println!();
    println!("Environment Variables:");
    println!("  TWILIO_ACCOUNT_SID        Twilio account SID");
    println!("  TWILIO_AUTH_TOKEN         Twilio auth token");
    println!("  TWILIO_WHATSAPP_FROM      Sender address (whatsapp:+1...)");
    println!("  TWILIO_API_BASE_URL       Twilio API base URL (default: https://api.twilio.com)");
    println!("  TWILIO_TIMEOUT_SECS       Twilio request timeout (default: 30)");
    println!("  PORT                      HTTP port (default: 8000)");
    println!("  CORS_ALLOWED_ORIGINS      Comma-separated origins (default: any)");
    println!("  WEBHOOK_DELIVERY_FAILURE  log or surface (default: log)");
    println!("  CONFIG_PATH               TOML config file (default: ./clinic-bot.toml)");
}
