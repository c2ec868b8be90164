//! Scan commands.

use std::time::Duration;

use clap::{Args, Subcommand};
use nlwifi::nl80211::{
    ScanControl, ScanEventKind, ScanRequest, ScanType, ScanUtils, SchedScanIntervalSetting,
    SchedScanPlan, SchedScanReqFlags, SchedScanRequest,
};
use nlwifi::output::print_all;
use tokio::sync::mpsc;

use crate::Context;

#[derive(Args)]
pub struct ScanArgs {
    /// Scan type: low-span, low-power or high-accuracy.
    #[arg(short = 't', long = "type", default_value = "low-power")]
    scan_type: ScanType,

    /// Actively scan for this SSID (repeatable).
    #[arg(short, long)]
    ssid: Vec<String>,

    /// Only scan this frequency in MHz (repeatable).
    #[arg(short, long)]
    freq: Vec<u32>,

    /// Use a random source address.
    #[arg(long)]
    random_mac: bool,

    /// Discover 6 GHz networks through reduced neighbor reports.
    #[arg(long)]
    rnr: bool,

    /// Seconds to wait for the scan to finish.
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[derive(Subcommand)]
pub enum SchedCmd {
    /// Start a scheduled scan.
    Start {
        /// Scan interval in milliseconds.
        #[arg(long, default_value_t = 10_000)]
        interval: u32,

        /// Fast iterations at --fast-interval before switching to --interval.
        #[arg(long, requires = "fast_interval")]
        fast_iterations: Option<u32>,

        /// Interval in milliseconds for the fast iterations.
        #[arg(long)]
        fast_interval: Option<u32>,

        /// Report networks with this SSID (repeatable).
        #[arg(short, long = "match")]
        match_ssid: Vec<String>,

        /// Actively scan for this SSID (repeatable).
        #[arg(short, long)]
        ssid: Vec<String>,

        /// Minimum RSSI in dBm for reported networks.
        #[arg(long, default_value_t = -80, allow_negative_numbers = true)]
        rssi: i32,

        /// Use a random source address.
        #[arg(long)]
        random_mac: bool,
    },
    /// Stop the scheduled scan.
    Stop,
}

pub async fn run(ctx: &Context, args: ScanArgs) -> anyhow::Result<()> {
    let iface = ctx.interface().await?;
    let scanner = ScanUtils::new(&ctx.transport, &ctx.registry);

    let (tx, mut rx) = mpsc::unbounded_channel();
    scanner.subscribe_scan_result_notification(iface.index, move |_, kind| {
        let _ = tx.send(kind);
    });

    let mut request = ScanRequest::new(args.scan_type)
        .request_random_mac(args.random_mac)
        .enable_6ghz_rnr(args.rnr)
        .freqs(args.freq);
    for ssid in args.ssid {
        request = request.ssid(ssid);
    }
    scanner.scan(iface.index, request).await?;

    let events = ctx.transport.run_events();
    tokio::pin!(events);
    let deadline = tokio::time::sleep(Duration::from_secs(args.timeout));
    tokio::pin!(deadline);

    let kind = loop {
        tokio::select! {
            res = &mut events => {
                res?;
                anyhow::bail!("event socket closed");
            }
            _ = &mut deadline => anyhow::bail!("scan did not finish within {}s", args.timeout),
            Some(kind) = rx.recv() => break kind,
        }
    };
    scanner.unsubscribe_scan_result_notification(iface.index);

    if kind == ScanEventKind::Aborted {
        anyhow::bail!("scan aborted");
    }

    results(ctx).await
}

pub async fn results(ctx: &Context) -> anyhow::Result<()> {
    let iface = ctx.interface().await?;
    let scanner = ScanUtils::new(&ctx.transport, &ctx.registry);
    let mut results = scanner.get_scan_result(iface.index).await?;
    results.sort_by(|a, b| b.signal_mbm.cmp(&a.signal_mbm));

    print_all(&mut std::io::stdout().lock(), &results, ctx.format, &ctx.opts)?;
    Ok(())
}

pub async fn sched(ctx: &Context, cmd: SchedCmd) -> anyhow::Result<()> {
    let iface = ctx.interface().await?;
    let scanner = ScanUtils::new(&ctx.transport, &ctx.registry);

    match cmd {
        SchedCmd::Start {
            interval,
            fast_iterations,
            fast_interval,
            match_ssid,
            ssid,
            rssi,
            random_mac,
        } => {
            let plans = match (fast_iterations, fast_interval) {
                (Some(n_iterations), Some(interval_ms)) => vec![SchedScanPlan {
                    interval_ms,
                    n_iterations,
                }],
                _ => Vec::new(),
            };
            let mut request = SchedScanRequest::new(SchedScanIntervalSetting {
                plans,
                final_interval_ms: interval,
            })
            .rssi_thresholds(rssi, rssi, rssi)
            .flags(SchedScanReqFlags {
                request_random_mac: random_mac,
                ..Default::default()
            });
            for s in ssid {
                request = request.scan_ssid(s);
            }
            for s in match_ssid {
                request = request.match_ssid(s);
            }
            scanner.start_scheduled_scan(iface.index, request).await?;
        }
        SchedCmd::Stop => scanner.stop_scheduled_scan(iface.index).await?,
    }
    Ok(())
}
