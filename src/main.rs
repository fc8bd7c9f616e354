use std::io::Read;

use clap::{Parser, Subcommand};
use sipwise::api::{self, Calculator};
use sipwise::config::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sipwise", version, about = "SIP, EMI, retirement and XIRR calculators")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the calculators over HTTP.
    Serve {
        #[arg(long, env = "SIPWISE_HOST", default_value = DEFAULT_HOST)]
        host: String,
        #[arg(long, env = "SIPWISE_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        #[arg(long, env = "SIPWISE_LOG", default_value = "info")]
        log_level: String,
    },
    /// Run one calculator over a JSON payload and print the JSON result.
    Calc {
        #[arg(value_enum)]
        calculator: Calculator,
        #[arg(help = "JSON payload; read from stdin when omitted")]
        payload: Option<String>,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            host,
            port,
            log_level,
        } => {
            let config = match ServerConfig::build(Some(&host), Some(port), Some(&log_level)) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    std::process::exit(2);
                }
            };
            init_tracing(config.log_level.as_filter_str());
            if let Err(e) = api::run_http_server(&config).await {
                error!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Command::Calc {
            calculator,
            payload,
        } => {
            init_tracing("warn");
            let payload = match payload {
                Some(payload) => payload,
                None => {
                    let mut buf = String::new();
                    if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                        eprintln!("Failed to read payload from stdin: {e}");
                        std::process::exit(1);
                    }
                    buf
                }
            };
            match api::calculate_json(calculator, &payload) {
                Ok(body) => println!("{body}"),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
