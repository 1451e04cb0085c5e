//! Expression-assembly state machine.
//!
//! The builder turns discrete user actions into a single expression
//! string. Finalized tokens live in `committed_expression`; the number
//! being typed lives in `current_token`, so deleting only ever edits the
//! token in progress and nothing is re-parsed per keystroke.

use super::error::InputRejected;
use super::guard::{leading_operator_guard, Guard, OperatorProposal};
use super::state::{BuilderState, Phase, ERROR_SENTINEL};
use super::token::{Function, Operator};
use tracing::debug;

/// Owns the in-progress expression of one session. No I/O, no timers.
///
/// # Example
///
/// ```rust
/// use tally::core::{ExpressionBuilder, Function, Operator};
///
/// let mut builder = ExpressionBuilder::new();
/// builder.append_digit_or_point('5').unwrap();
/// builder.append_function(Function::Sin);
/// builder.append_digit_or_point('3').unwrap();
/// builder.append_digit_or_point('0').unwrap();
///
/// assert_eq!(builder.current_expression_text(), "5 * sin(30");
/// ```
#[derive(Debug)]
pub struct ExpressionBuilder {
    state: BuilderState,
    generation: u64,
    operator_guard: Guard<OperatorProposal>,
}

impl Default for ExpressionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionBuilder {
    /// Create a builder in the initial empty state.
    pub fn new() -> Self {
        Self::from_state(BuilderState::default())
    }

    /// Resume from a previously captured state.
    pub fn from_state(state: BuilderState) -> Self {
        Self {
            state,
            generation: 0,
            operator_guard: leading_operator_guard(),
        }
    }

    /// Replace the operator admission rule. The default rejects binary
    /// operators as the first token.
    pub fn with_operator_guard(mut self, guard: Guard<OperatorProposal>) -> Self {
        self.operator_guard = guard;
        self
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Counter bumped by every applied transition. Rejected inputs and
    /// no-ops leave it unchanged.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `committed_expression + current_token`; used for display and as the
    /// evaluation request.
    pub fn current_expression_text(&self) -> String {
        self.state.expression_text()
    }

    /// Return to the initial empty state. Always succeeds.
    pub fn reset(&mut self) {
        let before = self.phase();
        self.state = BuilderState::default();
        self.applied(before);
    }

    /// Remove the last character of the token being typed.
    ///
    /// Right after an evaluation this clears the shown result instead, so
    /// the next input starts clean. Never reaches into the committed
    /// expression. Returns `false` when there was nothing to delete.
    pub fn delete_last(&mut self) -> bool {
        let before = self.phase();
        if self.state.pending_reset_on_next_input {
            self.state.current_token.clear();
            self.state.pending_reset_on_next_input = false;
        } else if self.state.current_token.pop().is_none() {
            return false;
        }
        self.applied(before);
        true
    }

    /// Append a digit or decimal point to the current token.
    pub fn append_digit_or_point(&mut self, ch: char) -> Result<(), InputRejected> {
        if !(ch.is_ascii_digit() || ch == '.') {
            return Err(InputRejected::NotADigit(ch));
        }

        let before = self.phase();
        if self.state.pending_reset_on_next_input {
            self.state.committed_expression.clear();
            self.state.current_token = ch.to_string();
            self.state.pending_reset_on_next_input = false;
        } else if ch == '.' && self.state.current_token.contains('.') {
            return Err(InputRejected::DuplicateDecimalPoint);
        } else {
            self.state.current_token.push(ch);
        }
        self.applied(before);
        Ok(())
    }

    /// Commit the current token and append `op` surrounded by spaces.
    ///
    /// Right after a successful evaluation the previous result seeds the
    /// new expression. After a failed one the error sentinel is dropped and
    /// the operator counts as the first token.
    pub fn append_operator(&mut self, op: Operator) -> Result<(), InputRejected> {
        let proposal = OperatorProposal::new(&self.state, op);
        if !self.operator_guard.check(&proposal) {
            return Err(InputRejected::LeadingOperator(op));
        }

        let before = self.phase();
        if self.state.pending_reset_on_next_input {
            let seed = if self.state.shows_error() {
                String::new()
            } else {
                std::mem::take(&mut self.state.current_token)
            };
            self.state.committed_expression = seed;
            self.state.current_token.clear();
            self.state.pending_reset_on_next_input = false;
        } else {
            let token = std::mem::take(&mut self.state.current_token);
            self.state.committed_expression.push_str(&token);
        }
        self.state.committed_expression.push_str(&op.token());
        self.applied(before);
        Ok(())
    }

    /// Append `name(`. A number being typed is multiplied by the function
    /// (`5` then `sin` gives `5 * sin(`).
    pub fn append_function(&mut self, function: Function) {
        let before = self.phase();
        if self.state.pending_reset_on_next_input {
            self.state = BuilderState::default();
        } else if !self.state.current_token.is_empty() {
            let token = std::mem::take(&mut self.state.current_token);
            self.state.committed_expression.push_str(&token);
            self.state
                .committed_expression
                .push_str(&Operator::Multiply.token());
        }
        self.state.committed_expression.push_str(&function.token());
        self.applied(before);
    }

    /// Enter the reset-to-result state: the result becomes the current
    /// token and the next input starts fresh (or, for an operator, builds on
    /// it).
    pub fn show_result(&mut self, result: impl Into<String>) {
        let before = self.phase();
        self.state = BuilderState {
            committed_expression: String::new(),
            current_token: result.into(),
            pending_reset_on_next_input: true,
        };
        self.applied(before);
    }

    /// Enter the error-display state.
    pub fn show_error(&mut self) {
        self.show_result(ERROR_SENTINEL);
    }

    /// Reset, then replay `text` through the ordinary transitions.
    ///
    /// This is the entry point for text produced outside the keypad (voice
    /// transcripts, history replay). Cosmetic operator symbols are accepted.
    /// On the first rejected token the previous state is restored; an
    /// unrecognized token reports its character position, not a byte offset.
    pub fn load_expression(&mut self, text: &str) -> Result<(), InputRejected> {
        let saved_state = std::mem::take(&mut self.state);
        let saved_generation = self.generation;
        let before = saved_state.phase();

        if let Err(rejected) = self.replay_text(text) {
            self.state = saved_state;
            self.generation = saved_generation;
            return Err(rejected);
        }

        self.generation = saved_generation;
        self.applied(before);
        Ok(())
    }

    fn replay_text(&mut self, text: &str) -> Result<(), InputRejected> {
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let (position, ch) = (i, chars[i]);

            if ch.is_whitespace() {
                i += 1;
            } else if ch.is_ascii_digit() || ch == '.' {
                self.append_digit_or_point(ch)?;
                i += 1;
            } else if ch.is_alphabetic() {
                let start = i;
                while i < chars.len() && chars[i].is_alphabetic() {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();

                let mut next = i;
                while next < chars.len() && chars[next].is_whitespace() {
                    next += 1;
                }
                let opens_group = next < chars.len() && chars[next] == '(';

                match (Function::from_name(&word), opens_group) {
                    (Some(function), true) => {
                        self.append_function(function);
                        i = next + 1;
                    }
                    _ => match Operator::from_symbol(&word) {
                        Some(op) => self.append_operator(op)?,
                        None => {
                            return Err(InputRejected::Unrecognized {
                                text: word,
                                position,
                            })
                        }
                    },
                }
            } else {
                let symbol = ch.to_string();
                match Operator::from_symbol(&symbol) {
                    Some(op) => self.append_operator(op)?,
                    None => {
                        return Err(InputRejected::Unrecognized {
                            text: symbol,
                            position,
                        })
                    }
                }
                i += 1;
            }
        }
        Ok(())
    }

    fn applied(&mut self, before: Phase) {
        self.generation += 1;
        let after = self.phase();
        if before != after {
            debug!(
                from = before.name(),
                to = after.name(),
                generation = self.generation,
                "builder phase changed"
            );
        }
    }
}
