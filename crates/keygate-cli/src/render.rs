//! # Operator Output
//!
//! Plain-text rendering for command replies and the key export table.
//! Pure functions of their input so the exact output can be asserted.

use chrono::{DateTime, Utc};
use keygate_core::{format_instant, DurationPolicy, KeyStatus};

use crate::client::{IssuedKeys, KeySummary};

const TABLE_HEADERS: [&str; 4] = ["KEY", "DURATION", "STATUS", "NOTE"];

/// Reply to `genkey`: a summary line, the policy and note, then one key per line.
pub fn render_issued(issued: &IssuedKeys) -> String {
    let policy = issued
        .duration
        .parse::<DurationPolicy>()
        .map(|p| p.describe())
        .unwrap_or_else(|_| issued.duration.clone());

    let mut out = format!(
        "Issued {} key(s)\nDuration: {policy}\nNote: {}\n\n",
        issued.keys.len(),
        issued.note
    );
    for key in &issued.keys {
        out.push_str(key);
        out.push('\n');
    }
    out
}

/// Reply to `checkkey`.
pub fn render_key(key: &KeySummary, now: DateTime<Utc>) -> String {
    let expiry = match key.expires_at {
        None => "waiting for first activation".to_string(),
        Some(exp) if key.status == KeyStatus::Expired => {
            format!("{} (expired)", format_instant(exp))
        }
        Some(exp) => format!("{} (in {})", format_instant(exp), remaining(exp - now)),
    };

    format!(
        "Key:      {}\nDuration: {} hours\nStatus:   {}\nExpires:  {expiry}\nHWID:     {}\nNote:     {}\n",
        key.key,
        key.duration_hours,
        key.status,
        key.bound_hwid.as_deref().unwrap_or("-"),
        key.note,
    )
}

/// Reply to `resetkey`.
pub fn render_reset(key: &KeySummary) -> String {
    format!(
        "Key {} reset. HWID cleared; the {}-hour window restarts on next activation.\n",
        key.key, key.duration_hours
    )
}

/// The `listkeys` export: one aligned row per key, in the order given.
pub fn render_table(keys: &[KeySummary]) -> String {
    let rows: Vec<[String; 4]> = keys
        .iter()
        .map(|k| {
            [
                k.key.clone(),
                format!("{}h", k.duration_hours),
                k.status.to_string(),
                k.note.clone(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &TABLE_HEADERS.map(String::from), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let last = cells.len() - 1;
    for (i, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        if i == last {
            out.push_str(cell);
        } else {
            let pad = width.saturating_sub(cell.chars().count());
            out.push_str(cell);
            out.push_str(&" ".repeat(pad + 2));
        }
    }
    out.push('\n');
}

fn remaining(left: chrono::Duration) -> String {
    let minutes = left.num_minutes().max(0);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap()
    }

    fn summary(key: &str, status: KeyStatus) -> KeySummary {
        let bound = status != KeyStatus::Unused;
        KeySummary {
            key: key.into(),
            duration_hours: 12,
            status,
            bound_hwid: bound.then(|| "pc-7".to_string()),
            expires_at: bound.then(|| t0() + Duration::hours(12)),
            note: "Free Key".into(),
            created_at: t0() - Duration::days(1),
        }
    }

    #[test]
    fn issued_lists_every_key() {
        let issued = IssuedKeys {
            keys: vec!["SWIFT-a".into(), "SWIFT-b".into()],
            duration: "random".into(),
            note: "vip".into(),
        };
        assert_eq!(
            render_issued(&issued),
            "Issued 2 key(s)\nDuration: random (6/12/24 hours)\nNote: vip\n\nSWIFT-a\nSWIFT-b\n"
        );
    }

    #[test]
    fn unused_key_has_no_hwid_or_expiry() {
        let out = render_key(&summary("SWIFT-a", KeyStatus::Unused), t0());
        assert!(out.contains("Status:   unused\n"));
        assert!(out.contains("Expires:  waiting for first activation\n"));
        assert!(out.contains("HWID:     -\n"));
    }

    #[test]
    fn active_key_shows_time_left() {
        let now = t0() + Duration::minutes(90);
        let out = render_key(&summary("SWIFT-a", KeyStatus::Active), now);
        assert!(out.contains("Expires:  2026-10-01T20:00:00.000Z (in 10h 30m)\n"));
        assert!(out.contains("HWID:     pc-7\n"));
    }

    #[test]
    fn expired_key_is_labelled() {
        let out = render_key(&summary("SWIFT-a", KeyStatus::Expired), t0() + Duration::days(2));
        assert!(out.contains("(expired)"));
    }

    #[test]
    fn table_aligns_columns() {
        let keys = vec![
            summary("SWIFT-longer-key", KeyStatus::Active),
            summary("X-1", KeyStatus::Unused),
        ];
        let table = render_table(&keys);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "KEY               DURATION  STATUS  NOTE");
        assert_eq!(lines[1], "SWIFT-longer-key  12h       active  Free Key");
        assert_eq!(lines[2], "X-1               12h       unused  Free Key");
    }

    #[test]
    fn empty_table_is_header_only() {
        assert_eq!(render_table(&[]), "KEY  DURATION  STATUS  NOTE\n");
    }
}
