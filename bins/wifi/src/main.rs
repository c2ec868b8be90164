//! wifi command - query wireless radios, scan and watch nl80211 events.

mod monitor;
mod scan;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use nlwifi::nl80211::{
    EventRegistry, InterfaceInfo, InterfaceMode, NetlinkUtils, Nl80211Transport, Transport,
    WifiInfo,
};
use nlwifi::output::formatting::parse_mac;
use nlwifi::output::{OutputFormat, OutputOptions, Printable, WiphySummary};

#[derive(Parser)]
#[command(name = "wifi", version, about = "Wireless device control via nl80211")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    /// Show details.
    #[arg(short = 'd', long, global = true)]
    details: bool,

    /// Radio to use instead of the first one reported.
    #[arg(long, global = true)]
    wiphy: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show bands, scan limits and features of the radio.
    Info,

    /// Show the station interface of the radio.
    #[command(visible_alias = "dev")]
    Interface,

    /// Switch the station interface to managed mode.
    SetStation,

    /// Show link counters for an associated station.
    Station {
        /// Station MAC address (aa:bb:cc:dd:ee:ff).
        mac: String,
    },

    /// Trigger a scan and print the results.
    Scan(scan::ScanArgs),

    /// Print the kernel scan cache.
    Results,

    /// Manage scheduled scans.
    #[command(subcommand)]
    Sched(scan::SchedCmd),

    /// Watch link, scan and regulatory events.
    #[command(visible_alias = "mon")]
    Monitor(monitor::MonitorArgs),
}

/// Everything a command needs to reach the kernel.
pub(crate) struct Context {
    pub transport: Nl80211Transport,
    pub registry: Arc<EventRegistry>,
    pub format: OutputFormat,
    pub opts: OutputOptions,
    wiphy: Option<u32>,
}

impl Context {
    pub fn utils(&self) -> NetlinkUtils<'_, Nl80211Transport> {
        NetlinkUtils::new(&self.transport, &self.registry)
    }

    pub async fn wiphy(&self) -> nlwifi::Result<u32> {
        match self.wiphy {
            Some(wiphy) => Ok(wiphy),
            None => self.utils().get_wiphy_index().await,
        }
    }

    pub async fn interface(&self) -> nlwifi::Result<InterfaceInfo> {
        let wiphy = self.wiphy().await?;
        self.utils().get_interface_info(wiphy).await
    }

    pub fn print<P: Printable>(&self, item: &P) -> std::io::Result<()> {
        item.print(&mut std::io::stdout().lock(), self.format, &self.opts)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let opts = OutputOptions {
        details: cli.details,
        pretty: cli.pretty,
    };

    let transport = Nl80211Transport::new().await?;
    let registry = Arc::new(EventRegistry::new());
    transport.register_event_listener(registry.clone());

    let ctx = Context {
        transport,
        registry,
        format,
        opts,
        wiphy: cli.wiphy,
    };

    match cli.command {
        Command::Info => show_info(&ctx).await,
        Command::Interface => {
            let info = ctx.interface().await?;
            ctx.print(&info)?;
            Ok(())
        }
        Command::SetStation => {
            let info = ctx.interface().await?;
            ctx.utils()
                .set_interface_mode(info.index, InterfaceMode::Station)
                .await?;
            Ok(())
        }
        Command::Station { mac } => show_station(&ctx, &mac).await,
        Command::Scan(args) => scan::run(&ctx, args).await,
        Command::Results => scan::results(&ctx).await,
        Command::Sched(cmd) => scan::sched(&ctx, cmd).await,
        Command::Monitor(args) => monitor::run(&ctx, args).await,
    }
}

async fn show_info(ctx: &Context) -> anyhow::Result<()> {
    let wiphy = ctx.wiphy().await?;
    let (bands, capabilities, features) = ctx.utils().get_wiphy_info(wiphy).await?;
    ctx.print(&WiphySummary {
        wiphy,
        bands,
        capabilities,
        features,
    })?;
    Ok(())
}

async fn show_station(ctx: &Context, mac: &str) -> anyhow::Result<()> {
    let Some(mac) = parse_mac(mac) else {
        anyhow::bail!("invalid MAC address '{}'", mac);
    };
    let iface = ctx.interface().await?;
    let info = ctx.utils().get_station_info(iface.index, mac).await?;
    ctx.print(&info)?;
    Ok(())
}
