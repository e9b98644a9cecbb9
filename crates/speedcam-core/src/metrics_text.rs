//! Parses the two border-router counters out of a Prometheus text-exposition
//! response body.
//!
//! Only `border_input_bytes_total` and `border_output_bytes_total` are read;
//! everything else in the body is ignored. This is deliberately not a general
//! Prometheus text-format parser — just enough to pull the two counters the
//! selector cares about.

use crate::bytes::ByteSize;

const INPUT_METRIC: &str = "border_input_bytes_total";
const OUTPUT_METRIC: &str = "border_output_bytes_total";

/// The two border counters read out of one metrics scrape, when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BorderCounters {
    pub bandwidth_in: Option<ByteSize>,
    pub bandwidth_out: Option<ByteSize>,
}

/// Scan `body` line by line for the two counters this daemon cares about.
///
/// A line is matched by its metric-name prefix; the counter value is the last
/// whitespace-separated token on the line (Prometheus text exposition puts the
/// sample value last, after any label set). Values are parsed as floating
/// point and truncated to whole bytes, since Prometheus samples are legally
/// rendered with a decimal point or exponent (`5678.0`, `1.2e9`) even for an
/// integer-valued counter. A line whose value doesn't parse at all is skipped
/// rather than failing the whole scrape.
pub fn parse_border_counters(body: &str) -> BorderCounters {
    let mut counters = BorderCounters::default();
    for line in body.lines() {
        if let Some(value) = line.strip_prefix(INPUT_METRIC).and_then(parse_trailing_value) {
            counters.bandwidth_in = Some(ByteSize(value));
        } else if let Some(value) = line
            .strip_prefix(OUTPUT_METRIC)
            .and_then(parse_trailing_value)
        {
            counters.bandwidth_out = Some(ByteSize(value));
        }
    }
    counters
}

fn parse_trailing_value(rest_of_line: &str) -> Option<u64> {
    let value: f64 = rest_of_line.trim().rsplit(' ').next()?.parse().ok()?;
    Some(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_counters_from_a_typical_scrape() {
        let body = "\
# HELP border_input_bytes_total total bytes received
# TYPE border_input_bytes_total counter
border_input_bytes_total 1234
# HELP border_output_bytes_total total bytes sent
# TYPE border_output_bytes_total counter
border_output_bytes_total 5678
";
        let counters = parse_border_counters(body);
        assert_eq!(counters.bandwidth_in, Some(ByteSize(1234)));
        assert_eq!(counters.bandwidth_out, Some(ByteSize(5678)));
    }

    #[test]
    fn parses_counters_with_label_sets() {
        let body = r#"border_input_bytes_total{iface="eth0"} 42"#;
        let counters = parse_border_counters(body);
        assert_eq!(counters.bandwidth_in, Some(ByteSize(42)));
        assert_eq!(counters.bandwidth_out, None);
    }

    #[test]
    fn ignores_unrelated_lines_and_unparsable_values() {
        let body = "some_other_metric 1\nborder_input_bytes_total not_a_number\n";
        let counters = parse_border_counters(body);
        assert_eq!(counters, BorderCounters::default());
    }

    #[test]
    fn empty_body_yields_no_counters() {
        assert_eq!(parse_border_counters(""), BorderCounters::default());
    }

    #[test]
    fn truncates_decimal_and_exponent_notation_to_bytes() {
        let body = "border_input_bytes_total 5678.0\nborder_output_bytes_total 1.2e9\n";
        let counters = parse_border_counters(body);
        assert_eq!(counters.bandwidth_in, Some(ByteSize(5678)));
        assert_eq!(counters.bandwidth_out, Some(ByteSize(1_200_000_000)));
    }
}
