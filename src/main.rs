use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::info;

use wifilink::backend::nm::NetworkManagerBackend;
use wifilink::backend::WifiBackend;
use wifilink::types::SettingKind;
use wifilink::{Config, ConnectionRequest, Connector};

/// wifilink — Wi-Fi connectivity bridge
#[derive(Parser, Debug)]
#[command(name = "wifilink", version, about, long_about = None)]
struct Cli {
    /// Log level filter (e.g. "info", "wifilink=debug")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Spacing between connection confirmation samples, in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan for nearby networks
    Scan {
        /// Emit the results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Connect to a network and wait for confirmation
    Connect {
        ssid: String,
        /// Passphrase; 64 hex characters are used verbatim as a PSK
        #[arg(short, long)]
        passphrase: Option<String>,
        /// Treat the passphrase as a WEP key
        #[arg(long)]
        wep: bool,
        /// Do not leave a persistent profile behind
        #[arg(long)]
        join_once: bool,
    },
    /// Show the currently-associated network
    Status,
    /// Show the current signal strength in dBm
    Signal,
    /// Switch the wireless radio
    Radio {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Check whether location services are enabled
    Location,
    /// Open a host settings screen
    Open {
        #[arg(value_enum)]
        kind: SettingKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let backend = match NetworkManagerBackend::new().await {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to reach NetworkManager: {e}");
            eprintln!("Is it running? Try: systemctl status NetworkManager");
            std::process::exit(1);
        }
    };
    let config = Config::default().with_poll_interval_ms(cli.poll_interval_ms);
    let connector = Connector::with_config(backend, config);

    match cli.command {
        Command::Scan { json } => {
            let results = connector.backend().scan().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for r in &results {
                    println!(
                        "{:32} {:18} {:>4} MHz  {:>3}%  {}",
                        r.ssid, r.bssid, r.frequency_mhz, r.signal_level, r.capabilities
                    );
                }
            }
        }
        Command::Connect {
            ssid,
            passphrase,
            wep,
            join_once,
        } => {
            let mut request = ConnectionRequest::new(ssid)
                .wep(wep)
                .join_once(join_once);
            if let Some(p) = passphrase {
                request = request.with_passphrase(SecretString::from(p));
            }

            // Ctrl+C interrupts the confirmation wait; the attempt then
            // reports a plain failure instead of aborting the process.
            let cancel = CancellationToken::new();
            let cancel_on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, abandoning confirmation wait");
                    cancel_on_signal.cancel();
                }
            });

            connector.connect(&request, &cancel).await?;
            println!("connected");
        }
        Command::Status => match connector.current_ssid().await? {
            Some(ssid) => println!("{ssid}"),
            None => println!("not connected"),
        },
        Command::Signal => {
            let dbm = connector.backend().signal_strength().await?;
            println!("{dbm} dBm");
        }
        Command::Radio { state } => {
            let enable = state == "on";
            connector.backend().set_radio_enabled(enable).await?;
            println!("radio {state}");
        }
        Command::Location => {
            let on = connector.backend().is_location_service_enabled().await?;
            println!("{}", if on { "enabled" } else { "disabled" });
        }
        Command::Open { kind } => {
            connector.backend().open_setting(kind).await?;
        }
    }

    Ok(())
}

fn init_logging(level: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
