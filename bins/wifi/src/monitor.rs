//! Monitor command - print nl80211 events as they arrive.

use clap::Args;
use nlwifi::nl80211::{ScanControl, ScanUtils, WifiInfo};
use nlwifi::output::{MonitorConfig, WifiEvent, print_event, print_monitor_start};
use tokio::sync::mpsc;

use crate::Context;

#[derive(Args)]
pub struct MonitorArgs {
    /// Prefix events with a timestamp.
    #[arg(short, long)]
    timestamp: bool,
}

pub async fn run(ctx: &Context, args: MonitorArgs) -> anyhow::Result<()> {
    let config = MonitorConfig::new()
        .with_timestamp(args.timestamp)
        .with_format(ctx.format)
        .with_opts(ctx.opts);

    let wiphy = ctx.wiphy().await?;
    let iface = ctx.interface().await?;
    let utils = ctx.utils();
    let scanner = ScanUtils::new(&ctx.transport, &ctx.registry);

    let (tx, mut rx) = mpsc::unbounded_channel();

    let mlme_tx = tx.clone();
    utils.subscribe_mlme_event(iface.index, move |ifindex, event| {
        let _ = mlme_tx.send(WifiEvent::Mlme {
            ifindex,
            event: event.clone(),
        });
    });
    let scan_tx = tx.clone();
    scanner.subscribe_scan_result_notification(iface.index, move |ifindex, kind| {
        let _ = scan_tx.send(WifiEvent::Scan { ifindex, kind });
    });
    utils.subscribe_reg_domain_change(wiphy, move |wiphy, alpha2| {
        let _ = tx.send(WifiEvent::RegDomain {
            wiphy,
            alpha2: alpha2.to_string(),
        });
    });

    let mut stdout = std::io::stdout();
    print_monitor_start(
        &mut stdout,
        &config,
        &format!("Monitoring {} (phy{})... Press Ctrl+C to stop.", iface.name, wiphy),
    )?;

    let events = ctx.transport.run_events();
    tokio::pin!(events);

    loop {
        tokio::select! {
            res = &mut events => {
                res?;
                break;
            }
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = rx.recv() => print_event(&mut stdout, &event, &config)?,
        }
    }

    utils.unsubscribe_mlme_event(iface.index);
    scanner.unsubscribe_scan_result_notification(iface.index);
    utils.unsubscribe_reg_domain_change(wiphy);
    Ok(())
}
