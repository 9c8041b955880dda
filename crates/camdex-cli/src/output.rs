//! Text rendering for camera tables and index status.

use chrono::{DateTime, SecondsFormat};

use camdex_core::{keys, pick_string, IndexStatus, LabelMap, RawCamera};

const MAX_CELL_WIDTH: usize = 40;

/// Render rows as a left-aligned, space-padded table.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count().min(MAX_CELL_WIDTH));
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    push_row(&mut out, &header, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = truncate(cells.get(i).map(String::as_str).unwrap_or(""), *width);
        if i + 1 == widths.len() {
            line.push_str(&cell);
        } else {
            line.push_str(&format!("{:<width$}  ", cell, width = *width));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        return cell.to_string();
    }
    let mut cut: String = cell.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

/// Camera table with the local label column; `wide` adds timezone.
pub fn camera_table(cameras: &[&RawCamera], labels: &LabelMap, wide: bool) -> String {
    let mut headers = vec!["camera_id", "label", "name", "site", "model", "serial", "status"];
    if wide {
        headers.push("timezone");
    }

    let rows: Vec<Vec<String>> = cameras
        .iter()
        .map(|raw| {
            let camera_id = pick_string(raw, keys::CAMERA_ID);
            let mut row = vec![
                labels.get(&camera_id).cloned().unwrap_or_default(),
                pick_string(raw, keys::NAME),
                pick_string(raw, keys::SITE),
                pick_string(raw, keys::MODEL),
                pick_string(raw, keys::SERIAL),
                pick_string(raw, keys::STATUS),
            ];
            if wide {
                row.push(pick_string(raw, keys::TIMEZONE));
            }
            row.insert(0, camera_id);
            row
        })
        .collect();

    render_table(&headers, &rows)
}

/// `built_at` as RFC 3339 UTC, empty when never built.
pub fn format_built_at(built_at: i64) -> String {
    if built_at <= 0 {
        return String::new();
    }
    DateTime::from_timestamp(built_at, 0)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Key/value status listing.
pub fn status_text(status: &IndexStatus) -> String {
    let lines = [
        ("path", status.path.display().to_string()),
        ("schema_version", status.schema_version.to_string()),
        ("built_at", format_built_at(status.built_at)),
        ("cameras", status.camera_count.to_string()),
        ("labels", status.label_count.to_string()),
        ("base_url", status.base_url.clone()),
        ("org_id", status.org_id.clone()),
        ("profile", status.profile.clone()),
    ];

    lines
        .iter()
        .map(|(key, value)| format!("{:<15} {}\n", format!("{}:", key), value))
        .collect()
}
