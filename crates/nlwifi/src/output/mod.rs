//! Output formatting (JSON/text) for the nl80211 domain types.

pub mod formatting;
mod monitor;
mod printable;

pub use monitor::{
    MonitorConfig, MonitorEvent, WifiEvent, print_event, print_monitor_start, write_timestamp,
};
pub use printable::WiphySummary;

use std::io::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Show raw information elements and per-chain signal levels.
    pub details: bool,
    /// Pretty print (for JSON).
    pub pretty: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Trait for types that can be printed.
pub trait Printable {
    /// Print as plain text.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()>;

    /// Convert to JSON value.
    fn to_json(&self) -> serde_json::Value;

    /// Print in the specified format.
    fn print<W: Write>(
        &self,
        w: &mut W,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> std::io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w, opts),
            OutputFormat::Json => write_json(w, &self.to_json(), opts),
        }
    }
}

/// Print a list of items; JSON output is a single array.
pub fn print_all<W: Write, T: Printable>(
    w: &mut W,
    items: &[T],
    format: OutputFormat,
    opts: &OutputOptions,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Text => {
            for item in items {
                item.print_text(w, opts)?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::Value::Array(items.iter().map(|i| i.to_json()).collect());
            write_json(w, &json, opts)
        }
    }
}

fn write_json<W: Write>(
    w: &mut W,
    json: &serde_json::Value,
    opts: &OutputOptions,
) -> std::io::Result<()> {
    if opts.pretty {
        serde_json::to_writer_pretty(&mut *w, json)?;
    } else {
        serde_json::to_writer(&mut *w, json)?;
    }
    writeln!(w)?;
    Ok(())
}
