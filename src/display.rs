//! Projection of builder and ledger state into display strings.
//!
//! Every function here is pure: the projector is re-run after each
//! transition and never mutates what it is given.

use crate::config::DisplayConfig;
use crate::core::{BuilderState, HistoryEntry, HistoryLedger, Phase, ResultValue, ERROR_SENTINEL};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator conventions for grouping integer digits.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberLocale {
    /// `1,234,567.89`
    #[default]
    EnUs,
    /// `1.234.567,89`
    DeDe,
    /// `1 234 567,89` with a narrow no-break space
    FrFr,
    /// `1234567.89`
    Plain,
}

impl NumberLocale {
    pub fn group_separator(&self) -> Option<char> {
        match self {
            Self::EnUs => Some(','),
            Self::DeDe => Some('.'),
            Self::FrFr => Some('\u{202F}'),
            Self::Plain => None,
        }
    }

    pub fn decimal_separator(&self) -> char {
        match self {
            Self::EnUs | Self::Plain => '.',
            Self::DeDe | Self::FrFr => ',',
        }
    }
}

/// What a front end shows after a transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayFrame {
    /// The main line: the token being typed or the last result.
    pub primary: String,
    /// The working line: the committed part of the expression.
    pub secondary: String,
}

/// One rendered row of the history panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryLine {
    pub id: Uuid,
    pub expression: String,
    pub result: String,
}

/// Maps builder and ledger state to human-readable strings.
///
/// # Example
///
/// ```rust
/// use tally::display::DisplayProjector;
///
/// let projector = DisplayProjector::default();
/// assert_eq!(projector.format_number("1234567.891"), "1,234,567.891");
/// assert_eq!(projector.format_number("0.30000000000000004"), "0.3000000000");
/// assert_eq!(projector.format_number("Error"), "Error");
/// ```
#[derive(Clone, Debug, Default)]
pub struct DisplayProjector {
    config: DisplayConfig,
}

impl DisplayProjector {
    pub fn new(config: DisplayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    /// Format a numeric token for the primary display.
    ///
    /// Tokens longer than `max_plain_length` characters are re-rendered with
    /// `significant_digits` significant digits. Otherwise the integer part
    /// is grouped and the fractional part is appended verbatim. An integer
    /// part that is empty or not a number renders as an empty string.
    pub fn format_number(&self, token: &str) -> String {
        if token == ERROR_SENTINEL {
            return token.to_string();
        }

        if token.chars().count() > self.config.max_plain_length {
            return match token.parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    to_precision(value, self.config.significant_digits)
                }
                _ => token.to_string(),
            };
        }

        let locale = self.config.locale;
        match token.split_once('.') {
            Some((integer, fraction)) => format!(
                "{}{}{}",
                group_integer(integer, locale),
                locale.decimal_separator(),
                fraction
            ),
            None => group_integer(token, locale),
        }
    }

    /// The secondary "working" line. Passed through verbatim.
    pub fn format_expression_line(&self, committed_expression: &str) -> String {
        committed_expression.to_string()
    }

    pub fn format_result(&self, result: &ResultValue) -> String {
        match result {
            ResultValue::Number(_) => self.format_number(&result.to_string()),
            ResultValue::Text(text) => text.clone(),
        }
    }

    /// Project builder state. An entirely empty current token shows `0`;
    /// a non-numeric result (units, matrices) is shown as received.
    pub fn frame(&self, state: &BuilderState) -> DisplayFrame {
        let token = &state.current_token;
        let primary = if token.is_empty() {
            "0".to_string()
        } else if state.phase() == Phase::ShowingResult && token.parse::<f64>().is_err() {
            token.clone()
        } else {
            self.format_number(token)
        };
        DisplayFrame {
            primary,
            secondary: self.format_expression_line(&state.committed_expression),
        }
    }

    pub fn history_line(&self, entry: &HistoryEntry) -> HistoryLine {
        HistoryLine {
            id: entry.id(),
            expression: format!("{} =", entry.expression()),
            result: self.format_result(entry.result()),
        }
    }

    /// Rows for the history panel, most recent first.
    pub fn history_lines(&self, ledger: &HistoryLedger) -> Vec<HistoryLine> {
        ledger
            .entries()
            .iter()
            .map(|entry| self.history_line(entry))
            .collect()
    }
}

/// Group the digits of an integer string. Leading zeros are dropped, the
/// sign is kept. Anything that is not an optionally signed digit run
/// renders as an empty string.
fn group_integer(integer: &str, locale: NumberLocale) -> String {
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return String::new();
    }

    let trimmed = digits.trim_start_matches('0');
    let digits = if trimmed.is_empty() { "0" } else { trimmed };

    let Some(separator) = locale.group_separator() else {
        return format!("{}{}", sign, digits);
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}

/// Render `value` with `digits` significant digits, switching to
/// exponential notation when the exponent is below -6 or at least
/// `digits`.
fn to_precision(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -6 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, value)
    }
}
