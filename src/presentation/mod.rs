//! Turns store query results into things a page can render.

pub mod charts;
pub mod map;
pub mod table;

pub use charts::{Chart, SummaryStats};
pub use map::MapView;
pub use table::TableView;

/// Whole-number rendering with thousands separators, e.g. `1,500,000`.
pub fn format_number(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Serialise a value for embedding inside a `<script>` element.
pub(crate) fn script_json(value: &serde_json::Value) -> String {
    // `<` only occurs inside JSON strings, where `\u003c` decodes to the same character.
    value.to_string().replace('<', "\\u003c")
}
