use similar::{ChangeTag, TextDiff};

use crate::model::SignalEnvelope;

fn header_lines(envelope: &SignalEnvelope) -> String {
    let mut lines = envelope
        .headers
        .iter()
        .flatten()
        .map(|(name, value)| format!("{}: {}\n", name.to_ascii_lowercase(), value.trim()))
        .collect::<Vec<_>>();
    lines.sort();
    lines.concat()
}

/// Line diff of both header maps, names lowercased and sorted.
pub fn render_header_diff(left: &SignalEnvelope, right: &SignalEnvelope) -> String {
    let old_str = header_lines(left);
    let new_str = header_lines(right);
    let diff = TextDiff::from_lines(&old_str, &new_str);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let symbol = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str(symbol);
        out.push_str(change.value());
    }
    out
}
