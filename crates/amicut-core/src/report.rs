//! Plain-text fleet reports.

use std::collections::{BTreeMap, BTreeSet};

pub const STATUS_HEADERS: [&str; 4] = ["Internal DNS", "Versions", "ELBs", "AMI"];

/// One table row. An instance spans as many rows as its longest column; the
/// shorter columns are blank on the extra rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRow {
    pub internal_name: Option<String>,
    pub version_ref: Option<String>,
    pub load_balancer: Option<String>,
    pub image_id: Option<String>,
}

impl StatusRow {
    fn cells(&self) -> [&str; 4] {
        [
            self.internal_name.as_deref().unwrap_or(""),
            self.version_ref.as_deref().unwrap_or(""),
            self.load_balancer.as_deref().unwrap_or(""),
            self.image_id.as_deref().unwrap_or(""),
        ]
    }
}

/// Zips an instance's name, version refs, load balancer names and image id
/// positionally, filling missing cells with `None`.
pub fn instance_rows(
    internal_name: &str,
    version_refs: &[String],
    load_balancers: &[String],
    image_id: &str,
) -> Vec<StatusRow> {
    let height = version_refs.len().max(load_balancers.len()).max(1);
    (0..height)
        .map(|i| StatusRow {
            internal_name: (i == 0).then(|| internal_name.to_string()),
            version_ref: version_refs.get(i).cloned(),
            load_balancer: load_balancers.get(i).cloned(),
            image_id: (i == 0).then(|| image_id.to_string()),
        })
        .collect()
}

pub fn render_status_table(rows: &[StatusRow]) -> String {
    let underline = STATUS_HEADERS.map(|h| "-".repeat(h.len()));
    let mut table: Vec<[&str; 4]> = vec![
        STATUS_HEADERS,
        [
            underline[0].as_str(),
            underline[1].as_str(),
            underline[2].as_str(),
            underline[3].as_str(),
        ],
    ];
    table.extend(rows.iter().map(StatusRow::cells));

    let mut widths = [0usize; 4];
    for line in &table {
        for (width, cell) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    table
        .iter()
        .map(|line| {
            line.iter()
                .zip(widths.iter())
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_plays(plays: &BTreeSet<String>) -> String {
    let mut lines = vec!["Active Plays".to_string(), "------------".to_string()];
    lines.extend(plays.iter().cloned());
    lines.join("\n")
}

pub fn render_tags(tags: &BTreeMap<String, String>) -> String {
    tags.iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
