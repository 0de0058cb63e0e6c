// Copyright (c) 2026 Roman Barinov <rbarinov@gmail.com>
// Licensed under the FSL-1.1-NC.

use xui_client::{config, PanelClient};

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "xui-client")]
#[command(about = "Command line client for X-UI panels", version)]
struct Args {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show host and xray status
    Status,
    /// Show panel settings
    Settings,
    /// Restart the panel
    Restart,
    /// List inbounds
    Inbounds,
    /// Show one inbound
    Inbound { id: i64 },
    /// Delete an inbound
    Delete { id: i64 },
    /// Print the share link of an inbound client
    Link {
        id: i64,
        /// Address clients connect to
        #[arg(long)]
        address: String,
        #[arg(long)]
        remark: Option<String>,
        #[arg(long, default_value_t = 0)]
        client: usize,
    },
    /// Show traffic counters of a client
    Traffic { email: String },
    /// List IPs seen for a client
    Ips { email: String },
    /// Forget the IPs seen for a client
    ClearIps { email: String },
    /// Reset traffic counters of a client
    ResetTraffic { id: i64, email: String },
    /// Remove clients that ran out of traffic or time
    DeleteDepleted { id: i64 },
    /// Print panel log lines
    Logs {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Print the generated xray configuration
    XrayConfig,
    /// End the stored session
    Logout,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xui_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = config::Config::load(args.config)?;

    tracing::debug!("Panel: {} ({})", config.panel.url, config.panel.flavor);

    let mut client = PanelClient::new(config.client_config())?;

    if let Command::Logout = args.command {
        client.logout().await?;
        return Ok(());
    }

    client
        .login(&config.auth.username, &config.auth.password)
        .await?;

    match args.command {
        Command::Status => print_json(&client.server_status().await?)?,
        Command::Settings => print_json(&client.settings().await?)?,
        Command::Restart => {
            client.restart_panel().await?;
            tracing::info!("Panel restart requested");
        }
        Command::Inbounds => {
            for inbound in client.list_inbounds().await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    inbound.id.unwrap_or_default(),
                    inbound.protocol(),
                    inbound.port,
                    if inbound.enable { "on" } else { "off" },
                    inbound.remark
                );
            }
        }
        Command::Inbound { id } => print_json(&client.get_inbound(id).await?)?,
        Command::Delete { id } => {
            client.delete_inbound(id).await?;
            tracing::info!("Deleted inbound {}", id);
        }
        Command::Link {
            id,
            address,
            remark,
            client: index,
        } => {
            // listing works on every panel, fetching by id does not
            let inbound = client
                .list_inbounds()
                .await?
                .into_iter()
                .find(|inbound| inbound.id == Some(id))
                .ok_or_else(|| anyhow::anyhow!("inbound {} not found", id))?;
            println!(
                "{}",
                inbound.access_link(&address, remark.as_deref(), index)?
            );
        }
        Command::Traffic { email } => match client.client_traffics(&email).await? {
            Some(stat) => print_json(&stat)?,
            None => anyhow::bail!("no traffic record for {}", email),
        },
        Command::Ips { email } => {
            for ip in client.client_ips(&email).await? {
                println!("{}", ip);
            }
        }
        Command::ClearIps { email } => client.clear_client_ips(&email).await?,
        Command::ResetTraffic { id, email } => client.reset_client_traffic(id, &email).await?,
        Command::DeleteDepleted { id } => client.delete_depleted_clients(id).await?,
        Command::Logs { limit } => {
            for line in client.server_log(limit).await? {
                println!("{}", line);
            }
        }
        Command::XrayConfig => print_json(&client.server_config().await?)?,
        Command::Logout => {}
    }

    Ok(())
}
