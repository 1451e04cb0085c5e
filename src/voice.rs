//! Speech transcript pre-processor.
//!
//! Turns a spoken phrase ("what is twelve times three point five") into a
//! plain expression string ("12 * 3 . 5") for
//! [`ExpressionBuilder::load_expression`](crate::core::ExpressionBuilder::load_expression).
//! Speech recognition itself happens elsewhere; this only maps words.

/// Multi-word phrases, longest first so they win over their prefixes.
const PHRASES: &[(&[&str], &str)] = &[
    (&["to", "the", "power", "of"], "^"),
    (&["square", "root", "of"], "sqrt("),
    (&["multiplied", "by"], "*"),
    (&["divided", "by"], "/"),
    (&["open", "parenthesis"], "("),
    (&["close", "parenthesis"], ")"),
    (&["open", "bracket"], "("),
    (&["close", "bracket"], ")"),
    (&["square", "root"], "sqrt("),
];

fn word_token(word: &str) -> Option<&'static str> {
    let token = match word {
        "plus" | "add" => "+",
        "minus" | "subtract" | "negative" => "-",
        "times" | "x" | "multiply" => "*",
        "over" | "divide" => "/",
        "power" => "^",
        "squared" => "^ 2",
        "cubed" => "^ 3",
        "point" | "dot" => ".",
        "sine" | "sin" => "sin(",
        "cosine" | "cos" => "cos(",
        "tangent" | "tan" => "tan(",
        "root" | "sqrt" => "sqrt(",
        "log" | "logarithm" => "log(",
        _ => return None,
    };
    Some(token)
}

fn unit_value(word: &str) -> Option<u64> {
    const UNITS: [&str; 20] = [
        "zero",
        "one",
        "two",
        "three",
        "four",
        "five",
        "six",
        "seven",
        "eight",
        "nine",
        "ten",
        "eleven",
        "twelve",
        "thirteen",
        "fourteen",
        "fifteen",
        "sixteen",
        "seventeen",
        "eighteen",
        "nineteen",
    ];
    UNITS.iter().position(|u| *u == word).map(|i| i as u64)
}

fn tens_value(word: &str) -> Option<u64> {
    const TENS: [&str; 8] = [
        "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];
    TENS.iter()
        .position(|t| *t == word)
        .map(|i| (i as u64 + 2) * 10)
}

fn scale_value(word: &str) -> Option<u64> {
    match word {
        "hundred" => Some(100),
        "thousand" => Some(1_000),
        "million" => Some(1_000_000),
        _ => None,
    }
}

/// Accumulates spelled-out numbers ("two hundred forty one").
#[derive(Default)]
struct NumberWords {
    total: u64,
    current: u64,
    active: bool,
}

impl NumberWords {
    /// Feed one word. Returns a finished number when the word starts a new
    /// one ("one two" is 1 then 2, not 3; "twenty eleven" is 20 then 11).
    fn push(&mut self, word: &str) -> Option<Option<u64>> {
        if let Some(unit) = unit_value(word) {
            let teen = (10..20).contains(&(self.current % 100));
            let splits = self.current % 10 != 0
                || teen
                || (unit >= 10 && self.current % 100 != 0);
            return Some(self.add(unit, !splits));
        }
        if let Some(tens) = tens_value(word) {
            return Some(self.add(tens, self.current % 100 == 0));
        }
        if let Some(scale) = scale_value(word) {
            if !self.active {
                return None;
            }
            let scaled = self.current.max(1).checked_mul(scale);
            let next = if scale == 100 {
                scaled
                    .filter(|current| self.total.checked_add(*current).is_some())
                    .map(|current| (self.total, current))
            } else {
                scaled
                    .and_then(|amount| self.total.checked_add(amount))
                    .map(|total| (total, 0))
            };
            return Some(match next {
                Some((total, current)) => {
                    self.total = total;
                    self.current = current;
                    None
                }
                // Out of range: finish the number so far and drop the word.
                None => self.flush(),
            });
        }
        None
    }

    /// Add `value` to the number in progress, or start a new number with it
    /// when it cannot join or `total + current` would leave `u64`.
    fn add(&mut self, value: u64, joins: bool) -> Option<u64> {
        let joined = self
            .current
            .checked_add(value)
            .filter(|current| self.total.checked_add(*current).is_some());

        let flushed = match joined {
            Some(current) if joins || !self.active => {
                self.current = current;
                None
            }
            _ => {
                let flushed = self.flush();
                self.current = value;
                flushed
            }
        };
        self.active = true;
        flushed
    }

    fn flush(&mut self) -> Option<u64> {
        if !self.active {
            return None;
        }
        let value = self.total.saturating_add(self.current);
        *self = Self::default();
        Some(value)
    }
}

fn is_expression_literal(word: &str) -> bool {
    word.chars()
        .all(|c| c.is_ascii_digit() || ".+-*/^()×÷".contains(c))
}

/// Map a lower- or mixed-case speech transcript to expression text.
/// Words that carry no arithmetic meaning are dropped.
///
/// # Example
///
/// ```rust
/// use tally::voice::transcript_to_expression;
///
/// assert_eq!(transcript_to_expression("What is five plus three?"), "5 + 3");
/// assert_eq!(transcript_to_expression("square root of sixty four"), "sqrt( 64");
/// assert_eq!(transcript_to_expression("two hundred and one times 3"), "201 * 3");
/// ```
pub fn transcript_to_expression(transcript: &str) -> String {
    let cleaned: String = transcript
        .to_lowercase()
        .chars()
        .map(|c| if matches!(c, ',' | '?' | '!' | ';' | ':') { ' ' } else { c })
        .collect();
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .map(|w| w.trim_end_matches('.'))
        .filter(|w| !w.is_empty())
        .collect();

    let mut pieces: Vec<String> = Vec::new();
    let mut number = NumberWords::default();
    let mut i = 0;

    while i < words.len() {
        let word = words[i];

        // "and" inside a spelled number ("two hundred and one") is filler.
        if word == "and" && number.active {
            i += 1;
            continue;
        }

        match number.push(word) {
            Some(Some(finished)) => {
                pieces.push(finished.to_string());
                i += 1;
                continue;
            }
            Some(None) => {
                i += 1;
                continue;
            }
            None => {}
        }

        if let Some(finished) = number.flush() {
            pieces.push(finished.to_string());
        }

        if let Some((phrase, token)) = PHRASES
            .iter()
            .find(|(phrase, _)| words[i..].starts_with(phrase))
        {
            pieces.push(token.to_string());
            i += phrase.len();
            continue;
        }

        if let Some(token) = word_token(word) {
            pieces.push(token.to_string());
        } else if is_expression_literal(word) {
            pieces.push(word.to_string());
        }
        i += 1;
    }

    if let Some(finished) = number.flush() {
        pieces.push(finished.to_string());
    }

    pieces.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExpressionBuilder;

    #[test]
    fn operator_words_map_to_symbols() {
        assert_eq!(transcript_to_expression("six times seven"), "6 * 7");
        assert_eq!(transcript_to_expression("eight divided by two"), "8 / 2");
        assert_eq!(transcript_to_expression("nine minus four"), "9 - 4");
        assert_eq!(transcript_to_expression("two to the power of ten"), "2 ^ 10");
    }

    #[test]
    fn spelled_numbers_compose() {
        assert_eq!(transcript_to_expression("forty two"), "42");
        assert_eq!(transcript_to_expression("one thousand two hundred"), "1200");
        assert_eq!(transcript_to_expression("nineteen"), "19");
    }

    #[test]
    fn adjacent_digits_stay_separate_numbers() {
        assert_eq!(transcript_to_expression("one two"), "1 2");
        assert_eq!(transcript_to_expression("twenty thirty"), "20 30");
        assert_eq!(transcript_to_expression("twenty eleven"), "20 11");
        assert_eq!(transcript_to_expression("one hundred eleven"), "111");
    }

    #[test]
    fn oversized_numbers_stop_at_u64_range() {
        let chain = vec!["hundred"; 30].join(" ");

        let expression = transcript_to_expression(&format!("one {chain} plus two"));

        assert_eq!(expression, "1000000000000000000 + 2");
    }

    #[test]
    fn scale_past_u64_range_is_dropped() {
        let chain = vec!["hundred"; 7].join(" ");

        let expression = transcript_to_expression(&format!("one {chain} million"));

        assert_eq!(expression, "100000000000000");
    }

    #[test]
    fn decimal_point_words() {
        assert_eq!(transcript_to_expression("three point one four"), "3 . 1 4");
    }

    #[test]
    fn functions_and_groups() {
        assert_eq!(transcript_to_expression("sine of thirty"), "sin( 30");
        assert_eq!(
            transcript_to_expression("open bracket one plus two close bracket squared"),
            "( 1 + 2 ) ^ 2"
        );
    }

    #[test]
    fn literals_pass_through_and_filler_is_dropped() {
        assert_eq!(transcript_to_expression("calculate 12 + 30 please"), "12 + 30");
        assert_eq!(transcript_to_expression("hello there"), "");
    }

    #[test]
    fn output_loads_into_builder() {
        let mut builder = ExpressionBuilder::new();
        builder
            .load_expression(&transcript_to_expression("three point one four times two"))
            .unwrap();
        assert_eq!(builder.current_expression_text(), "3.14 * 2");
    }
}
