//! # Key Subcommands
//!
//! Operator commands against the management API:
//!
//! - `genkey` — issue a batch of keys under one prefix and duration policy.
//! - `checkkey` — show a key's duration, status, expiry, HWID and note.
//! - `resetkey` — clear a key's HWID so it can be activated again.
//! - `listkeys` — export keys as a text table, to stdout or a file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use keygate_core::{DurationPolicy, KeyFilter, KeyPrefix};

use crate::client::{IssueKeys, KeygateClient};
use crate::render::{render_issued, render_key, render_reset, render_table};

/// Arguments for `keygate genkey`.
#[derive(Args, Debug)]
pub struct GenkeyArgs {
    /// Key prefix (e.g. "SWIFT"). Uppercased; no whitespace, at most 32 characters.
    #[arg(long)]
    pub prefix: String,
    /// Validity window after first use: hours (1-8760) or "random" for 6/12/24.
    #[arg(long)]
    pub duration: DurationPolicy,
    /// Number of keys to issue. The server clamps this to 1-50.
    #[arg(long, value_parser = parse_amount, allow_negative_numbers = true)]
    pub amount: Option<i64>,
    /// Note stored on every key. Defaults to "Free Key".
    #[arg(long)]
    pub note: Option<String>,
}

/// Arguments for `keygate checkkey`.
#[derive(Args, Debug)]
pub struct CheckkeyArgs {
    /// The license key to inspect.
    pub key: String,
}

/// Arguments for `keygate resetkey`.
#[derive(Args, Debug)]
pub struct ResetkeyArgs {
    /// The license key to reset.
    pub key: String,
}

/// Arguments for `keygate listkeys`.
#[derive(Args, Debug)]
pub struct ListkeysArgs {
    /// Which keys to export: all, used or unused.
    #[arg(long, default_value_t = KeyFilter::All)]
    pub filter: KeyFilter,
    /// Write the table to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Parse `--amount`, saturating out-of-range numbers to the `i64` range.
fn parse_amount(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if !f.is_nan() => Ok(f as i64),
        _ => Err(format!("{raw:?} is not a number")),
    }
}

/// Issue keys and print them.
pub async fn run_genkey(
    args: &GenkeyArgs,
    client: &KeygateClient,
    out: &mut impl Write,
) -> Result<u8> {
    let prefix = KeyPrefix::new(args.prefix.as_str()).context("invalid --prefix")?;
    let req = IssueKeys {
        prefix: prefix.to_string(),
        duration: args.duration,
        count: args.amount,
        note: args.note.clone(),
    };

    let issued = client.issue(&req).await.context("failed to issue keys")?;
    tracing::info!(count = issued.keys.len(), prefix = %prefix, "keys issued");
    out.write_all(render_issued(&issued).as_bytes())?;
    Ok(0)
}

/// Print one key's details.
pub async fn run_checkkey(
    args: &CheckkeyArgs,
    client: &KeygateClient,
    out: &mut impl Write,
) -> Result<u8> {
    let key = args.key.trim();
    if key.is_empty() {
        bail!("key must not be empty");
    }

    let Some(summary) = client.get_key(key).await.context("failed to look up key")? else {
        bail!("key {key} not found");
    };
    out.write_all(render_key(&summary, Utc::now()).as_bytes())?;
    Ok(0)
}

/// Clear a key's binding and expiry.
pub async fn run_resetkey(
    args: &ResetkeyArgs,
    client: &KeygateClient,
    out: &mut impl Write,
) -> Result<u8> {
    let key = args.key.trim();
    if key.is_empty() {
        bail!("key must not be empty");
    }

    let Some(summary) = client.reset_key(key).await.context("failed to reset key")? else {
        bail!("key {key} not found");
    };
    tracing::info!(key = %summary.key, "key reset");
    out.write_all(render_reset(&summary).as_bytes())?;
    Ok(0)
}

/// Export keys as a text table.
pub async fn run_listkeys(
    args: &ListkeysArgs,
    client: &KeygateClient,
    out: &mut impl Write,
) -> Result<u8> {
    let keys = client
        .list_keys(args.filter)
        .await
        .context("failed to list keys")?;
    let table = render_table(&keys);

    match &args.output {
        Some(path) => {
            std::fs::write(path, &table)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(
                out,
                "Exported {} {} key(s) to {}",
                keys.len(),
                args.filter,
                path.display()
            )?;
        }
        None => out.write_all(table.as_bytes())?,
    }
    Ok(0)
}
