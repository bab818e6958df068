// src/stats/format.rs
//! Human-readable renderings of durations, hashrates and odds

/// Shown wherever a value is missing or meaningless
pub const PLACEHOLDER: &str = "—";

const YEAR_SECS: f64 = 365.0 * 86_400.0;
const HASHRATE_UNITS: [&str; 7] = ["H/s", "KH/s", "MH/s", "GH/s", "TH/s", "PH/s", "EH/s"];

/// Formats a duration as its three most significant components
///
/// `"3y 41d 7h"`, `"12m 5s"`, `"0s"`. Durations of 10,000 years or more are
/// rendered as a whole number of years grouped with dots, e.g.
/// `"1.234.567 years"`. Zero, negative and non-finite inputs yield
/// [`PLACEHOLDER`].
pub fn human_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return PLACEHOLDER.to_string();
    }

    let years = (seconds / YEAR_SECS).floor();
    if years >= 10_000.0 {
        return format!("{} years", group_digits(&format!("{:.0}", years), '.'));
    }

    let mut rest = seconds - years * YEAR_SECS;
    let days = (rest / 86_400.0).floor();
    rest -= days * 86_400.0;
    let hours = (rest / 3_600.0).floor();
    rest -= hours * 3_600.0;
    let minutes = (rest / 60.0).floor();
    let secs = (rest - minutes * 60.0).floor();

    let parts: Vec<String> = [
        (years, "y"),
        (days, "d"),
        (hours, "h"),
        (minutes, "m"),
        (secs, "s"),
    ]
    .iter()
    .filter(|(value, _)| *value >= 1.0)
    .take(3)
    .map(|(value, unit)| format!("{}{}", *value as u64, unit))
    .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Formats a hashrate with an SI unit, e.g. `"250.0 KH/s"`, `"1.23 GH/s"`
pub fn human_hashrate(hps: f64) -> String {
    let mut value = if hps.is_finite() { hps.max(0.0) } else { 0.0 };
    let mut unit = 0;
    while value >= 1000.0 && unit < HASHRATE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let number = if value < 10.0 {
        format!("{:.2}", value)
    } else if value < 100.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.0}", value)
    };
    format!("{} {}", number, HASHRATE_UNITS[unit])
}

/// Formats a probability as percentage and odds
///
/// * `p >= 0.0001` → `"12.34% (1 in 8)"`, with `"100%"` once the
///   percentage would round to it
/// * smaller → `"1 in 4.20e12"`
/// * zero, negative or non-finite → [`PLACEHOLDER`]
pub fn human_probability(p: f64) -> String {
    if !p.is_finite() || p <= 0.0 {
        return PLACEHOLDER.to_string();
    }

    let pct = p * 100.0;
    let odds = one_in(1.0 / p);
    if pct >= 0.01 {
        let pct_str = if pct >= 99.995 {
            "100%".to_string()
        } else {
            format!("{:.2}%", pct)
        };
        format!("{} ({})", pct_str, odds)
    } else {
        odds
    }
}

/// `"1 in 2"`, `"1 in 123,457"` or `"1 in 1.23e15"`
fn one_in(n: f64) -> String {
    if !n.is_finite() || n <= 0.0 {
        return "1 in ∞".to_string();
    }
    if n < 1e6 {
        return format!("1 in {}", group_digits(&format!("{:.0}", n), ','));
    }
    let mut exp = n.log10().floor() as i32;
    let mut mantissa = n / 10f64.powi(exp);
    // log10 can land one short of an exact power of ten, and 9.996 would
    // print as "10.00"
    if mantissa >= 9.995 {
        mantissa /= 10.0;
        exp += 1;
    }
    format!("1 in {:.2}e{}", mantissa, exp)
}

/// Inserts `sep` between groups of three digits
fn group_digits(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}
