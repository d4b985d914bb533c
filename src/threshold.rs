use crate::ir::{Severity, Threshold};
use once_cell::sync::Lazy;
use regex::Regex;

static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<weight>[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*[xX]\s*(?P<sev>\d+)\s*$")
        .unwrap()
});

/// Decodes `weight x severity` entries separated by commas, sorted by weight.
pub fn parse_thresholds(data: &str) -> Vec<Threshold> {
    let mut out = Vec::new();
    for entry in data.split(',') {
        if entry.trim().is_empty() {
            continue;
        }
        let Some(caps) = ENTRY_RE.captures(entry) else {
            tracing::debug!(entry, "skipping malformed threshold entry");
            continue;
        };
        let weight = caps["weight"].parse::<f64>().ok();
        let severity = caps["sev"].parse::<i32>().ok().and_then(Severity::from_code);
        match (weight, severity) {
            (Some(weight), Some(severity)) if weight.is_finite() => {
                out.push(Threshold { weight, severity })
            }
            _ => tracing::debug!(entry, "skipping out of range threshold entry"),
        }
    }
    sort_thresholds(&mut out);
    out
}

pub fn sort_thresholds(thresholds: &mut [Threshold]) {
    thresholds.sort_by(|a, b| a.weight.total_cmp(&b.weight));
}

pub fn format_thresholds(thresholds: &[Threshold]) -> String {
    thresholds
        .iter()
        .map(|t| format!("{}x{}", t.weight, t.severity.code()))
        .collect::<Vec<_>>()
        .join(",")
}
