//! Formatting amounts for display.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// The currency symbol amounts are shown with.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Format `amount` as currency with two decimal places, e.g. "₹1,234.50".
pub fn format_currency(amount: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| whole_number_formatter(CURRENCY_SYMBOL));

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt =
        NEGATIVE_FMT.get_or_init(|| whole_number_formatter(&format!("-{CURRENCY_SYMBOL}")));

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    // numfmt renders zero as a bare "0" without the prefix.
    let whole_text = match (whole, amount < 0.0 && cents > 0) {
        (0, false) => format!("{CURRENCY_SYMBOL}0"),
        (0, true) => format!("-{CURRENCY_SYMBOL}0"),
        (_, false) => positive_fmt.fmt_string(whole as f64),
        (_, true) => negative_fmt.fmt_string(whole as f64),
    };

    format!("{whole_text}.{fraction:02}")
}

fn whole_number_formatter(prefix: &str) -> Formatter {
    Formatter::currency(prefix)
        .unwrap_or_default()
        .precision(Precision::Decimals(0))
}
