use std::sync::LazyLock;

use regex::Regex;

static THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d*)?|\.\d+)[Kk]").expect("thousands pattern"));
static MILLIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d*)?|\.\d+)[Mm]").expect("millions pattern"));
static PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d*)?|\.\d+").expect("plain number pattern"));

/// Longest fractional part that is still scaled exactly.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses a human-readable count such as `"1.2K"`, `"3,400"` or `"2M"`.
///
/// Unparseable input means "unknown" and yields 0. Fractions are truncated
/// toward zero after scaling; scaling is exact decimal arithmetic.
pub fn parse_count(text: &str) -> u64 {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() {
        return 0;
    }

    if cleaned.contains(['K', 'k']) {
        if let Some(number) = capture(&THOUSANDS, &cleaned) {
            return scale(number, 1_000);
        }
    } else if cleaned.contains(['M', 'm']) {
        if let Some(number) = capture(&MILLIONS, &cleaned) {
            return scale(number, 1_000_000);
        }
    }

    PLAIN
        .find(&cleaned)
        .map(|number| scale(number.as_str(), 1))
        .unwrap_or(0)
}

fn capture<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn scale(number: &str, factor: u64) -> u64 {
    let factor = u128::from(factor);
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));

    let whole = if whole.is_empty() {
        0
    } else {
        // Only digits reach here, so a parse failure is an overflow.
        whole.parse::<u128>().unwrap_or(u128::MAX)
    };
    let mut scaled = whole.saturating_mul(factor);

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let numerator = fraction.parse::<u128>().unwrap_or(0);
        let denominator = 10u128.pow(fraction.len() as u32);
        scaled = scaled.saturating_add(numerator * factor / denominator);
    }

    u64::try_from(scaled).unwrap_or(u64::MAX)
}
