use std::time::Duration;

use byte_unit::{Byte, UnitType};

/// Render a duration in the largest unit that keeps it above one.
pub(super) fn duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    let (div, unit) = match nanos {
        n if n < 1_000 => (1.0, "ns"),
        n if n < 1_000_000 => (1e3, "µs"),
        n if n < 1_000_000_000 => (1e6, "ms"),
        _ => (1e9, "s"),
    };
    format!("{:.2}{unit}", nanos as f64 / div)
}

/// Render a byte count with a binary unit.
pub(super) fn bytes(n: u64) -> String {
    format!("{:.2}", Byte::from_u64(n).get_appropriate_unit(UnitType::Binary))
}

/// Render an optional metric, `-` when undefined.
pub(super) fn metric(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(v) => format!("{v:.precision$}"),
        None => "-".to_owned(),
    }
}
