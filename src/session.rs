//! A calculator session: one builder, one ledger, one projector.
//!
//! The session is the imperative shell. Synchronous input goes through
//! [`Session::apply`]; evaluation is split into [`Session::begin_evaluation`]
//! and [`Session::complete`] so the caller decides how the request travels
//! and responses that arrive after the user moved on are dropped.

use crate::checkpoint::{CheckpointError, SessionCheckpoint};
use crate::config::CalculatorConfig;
use crate::core::{
    evaluable_guard, BuilderState, ExpressionBuilder, Function, Guard, HistoryLedger,
    InputRejected, LedgerChange, Operator, Phase,
};
use crate::display::{DisplayFrame, DisplayProjector, HistoryLine};
use crate::evaluation::{EvaluationClient, EvaluationOutcome, Evaluator, FailureKind};
use crate::voice::transcript_to_expression;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A single user action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Digit(char),
    Operator(Operator),
    Function(Function),
    Delete,
    Clear,
    Evaluate,
    ClearHistory,
    Replay(Uuid),
}

impl Action {
    /// Map a keyboard key name to an action.
    ///
    /// ```rust
    /// use tally::core::Operator;
    /// use tally::session::Action;
    ///
    /// assert_eq!(Action::from_key("7"), Some(Action::Digit('7')));
    /// assert_eq!(Action::from_key("*"), Some(Action::Operator(Operator::Multiply)));
    /// assert_eq!(Action::from_key("Enter"), Some(Action::Evaluate));
    /// assert_eq!(Action::from_key("F5"), None);
    /// ```
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Enter" | "=" => return Some(Self::Evaluate),
            "Backspace" => return Some(Self::Delete),
            "Escape" | "Delete" => return Some(Self::Clear),
            _ => {}
        }

        let mut chars = key.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_ascii_digit() || ch == '.' {
                return Some(Self::Digit(ch));
            }
        }

        Operator::from_symbol(key)
            .map(Self::Operator)
            .or_else(|| Function::from_name(key).map(Self::Function))
    }
}

/// What a synchronous action did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    Updated,
    /// The action was accepted but had nothing to act on.
    Unchanged,
    /// An evaluation should be sent; pass the ticket back to
    /// [`Session::complete`].
    EvaluationRequested(EvaluationTicket),
    /// The expression is blank. Nothing is sent.
    NothingToEvaluate,
}

/// An evaluation in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluationTicket {
    pub id: u64,
    /// Builder generation when the ticket was issued.
    pub generation: u64,
    /// Trimmed expression as typed. This is what history records.
    pub expression: String,
}

/// How an evaluation outcome was applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Recorded(Uuid),
    Failed { kind: FailureKind, message: String },
    /// Blank input; state untouched.
    Ignored,
    /// A newer ticket was issued or the builder changed since.
    Stale,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Rejected(#[from] InputRejected),

    #[error("No history entry with id {0}")]
    UnknownHistoryEntry(Uuid),
}

/// One independent calculator. Sessions share nothing.
///
/// # Example
///
/// ```rust
/// use tally::session::{Action, Applied, Completion, Session};
/// use tally::evaluation::EvaluationOutcome;
/// use tally::core::ResultValue;
///
/// let mut session = Session::default();
/// for key in ["2", "+", "3"] {
///     session.apply(Action::from_key(key).unwrap()).unwrap();
/// }
///
/// let Applied::EvaluationRequested(ticket) = session.apply(Action::Evaluate).unwrap() else {
///     panic!("expected a ticket");
/// };
/// assert_eq!(ticket.expression, "2 + 3");
///
/// let outcome = EvaluationOutcome::Success { result: ResultValue::Number(5.0) };
/// assert!(matches!(session.complete(&ticket, outcome), Completion::Recorded(_)));
/// assert_eq!(session.frame().primary, "5");
/// assert_eq!(session.history().len(), 1);
/// ```
pub struct Session {
    id: Uuid,
    builder: ExpressionBuilder,
    ledger: HistoryLedger,
    projector: DisplayProjector,
    evaluable: Guard<BuilderState>,
    next_ticket: u64,
    in_flight: Option<u64>,
    announcers: Vec<Announcer>,
    announcing: bool,
}

/// Receives the text of each successful result, e.g. to speak it aloud.
type Announcer = Box<dyn Fn(&str) + Send + Sync>;

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("builder", &self.builder)
            .field("ledger", &self.ledger)
            .field("in_flight", &self.in_flight)
            .field("announcers", &self.announcers.len())
            .field("announcing", &self.announcing)
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&CalculatorConfig::default())
    }
}

impl Session {
    pub fn new(config: &CalculatorConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            builder: ExpressionBuilder::new(),
            ledger: HistoryLedger::new().with_max_entries(config.history.max_entries),
            projector: DisplayProjector::new(config.display.clone()),
            evaluable: evaluable_guard(),
            next_ticket: 0,
            in_flight: None,
            announcers: Vec::new(),
            announcing: true,
        }
    }

    /// Rebuild a session from a checkpoint.
    pub fn restore(
        checkpoint: SessionCheckpoint,
        config: &CalculatorConfig,
    ) -> Result<Self, CheckpointError> {
        checkpoint.ensure_supported()?;

        let mut session = Self::new(config);
        session.id = checkpoint.id;
        session.builder = ExpressionBuilder::from_state(checkpoint.builder);
        session.ledger = HistoryLedger::from_entries(checkpoint.history)
            .with_max_entries(config.history.max_entries);

        info!(session = %session.id, entries = session.ledger.len(), "Session restored");
        Ok(session)
    }

    /// Snapshot builder state and history. Listeners, announcers and any
    /// in-flight evaluation are not captured.
    pub fn checkpoint(&self) -> SessionCheckpoint {
        SessionCheckpoint::new(
            self.id,
            self.builder.state().clone(),
            self.ledger.entries().to_vec(),
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn builder(&self) -> &ExpressionBuilder {
        &self.builder
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn projector(&self) -> &DisplayProjector {
        &self.projector
    }

    pub fn phase(&self) -> Phase {
        self.builder.phase()
    }

    /// Whether a ticket has been issued and not yet completed.
    pub fn is_evaluating(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn frame(&self) -> DisplayFrame {
        self.projector.frame(self.builder.state())
    }

    pub fn history_lines(&self) -> Vec<HistoryLine> {
        self.projector.history_lines(&self.ledger)
    }

    pub fn subscribe_history<F>(&mut self, listener: F)
    where
        F: Fn(&LedgerChange) + Send + Sync + 'static,
    {
        self.ledger.subscribe(listener);
    }

    /// Register a callback that receives each recorded result's text.
    pub fn on_result<F>(&mut self, announcer: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.announcers.push(Box::new(announcer));
    }

    /// Mute or unmute result announcements without dropping announcers.
    pub fn set_announcing(&mut self, announcing: bool) {
        self.announcing = announcing;
    }

    pub fn is_announcing(&self) -> bool {
        self.announcing
    }

    /// Apply one action. Rejected input leaves the session untouched.
    pub fn apply(&mut self, action: Action) -> Result<Applied, SessionError> {
        let applied = match action {
            Action::Digit(ch) => {
                self.builder.append_digit_or_point(ch)?;
                Applied::Updated
            }
            Action::Operator(op) => {
                self.builder.append_operator(op)?;
                Applied::Updated
            }
            Action::Function(function) => {
                self.builder.append_function(function);
                Applied::Updated
            }
            Action::Delete => {
                if self.builder.delete_last() {
                    Applied::Updated
                } else {
                    Applied::Unchanged
                }
            }
            Action::Clear => {
                self.builder.reset();
                Applied::Updated
            }
            Action::Evaluate => match self.begin_evaluation() {
                Some(ticket) => Applied::EvaluationRequested(ticket),
                None => Applied::NothingToEvaluate,
            },
            Action::ClearHistory => {
                self.ledger.clear();
                Applied::Updated
            }
            Action::Replay(id) => {
                self.replay(id)?;
                Applied::Updated
            }
        };
        Ok(applied)
    }

    /// Issue a ticket for the current expression, or `None` when it is
    /// blank. A new ticket supersedes any earlier one.
    pub fn begin_evaluation(&mut self) -> Option<EvaluationTicket> {
        if !self.evaluable.check(self.builder.state()) {
            debug!(session = %self.id, "Nothing to evaluate");
            return None;
        }

        self.next_ticket += 1;
        let ticket = EvaluationTicket {
            id: self.next_ticket,
            generation: self.builder.generation(),
            expression: self.builder.current_expression_text().trim().to_string(),
        };
        self.in_flight = Some(ticket.id);

        debug!(
            session = %self.id,
            ticket = ticket.id,
            expression = %ticket.expression,
            "Evaluation requested"
        );
        Some(ticket)
    }

    /// Apply the outcome for `ticket`.
    pub fn complete(&mut self, ticket: &EvaluationTicket, outcome: EvaluationOutcome) -> Completion {
        if self.in_flight != Some(ticket.id) || self.builder.generation() != ticket.generation {
            warn!(
                session = %self.id,
                ticket = ticket.id,
                expression = %ticket.expression,
                "Dropping stale evaluation response"
            );
            return Completion::Stale;
        }
        self.in_flight = None;

        match outcome {
            EvaluationOutcome::Success { result } => {
                let display = result.to_string();
                let id = self.ledger.record(ticket.expression.clone(), result).id();
                self.announce(&display);
                self.builder.show_result(display);
                Completion::Recorded(id)
            }
            EvaluationOutcome::Failure {
                kind: FailureKind::InputEmpty,
                ..
            } => Completion::Ignored,
            EvaluationOutcome::Failure { kind, message } => {
                self.builder.show_error();
                Completion::Failed { kind, message }
            }
        }
    }

    /// Evaluate the current expression through `client` and apply the
    /// outcome.
    pub async fn evaluate<E: Evaluator>(&mut self, client: &EvaluationClient<E>) -> Completion {
        let Some(ticket) = self.begin_evaluation() else {
            return Completion::Ignored;
        };
        let outcome = client.evaluate(&ticket.expression).await;
        self.complete(&ticket, outcome)
    }

    /// Show a history entry's result, ready to be built on.
    pub fn replay(&mut self, id: Uuid) -> Result<(), SessionError> {
        let entry = self
            .ledger
            .get(id)
            .ok_or(SessionError::UnknownHistoryEntry(id))?;
        let result = entry.result().to_string();
        self.builder.show_result(result);
        Ok(())
    }

    /// Load a history entry's expression for editing.
    pub fn replay_expression(&mut self, id: Uuid) -> Result<(), SessionError> {
        let expression = self
            .ledger
            .get(id)
            .map(|entry| entry.expression().to_string())
            .ok_or(SessionError::UnknownHistoryEntry(id))?;
        self.builder.load_expression(&expression)?;
        Ok(())
    }

    fn announce(&self, text: &str) {
        if !self.announcing {
            return;
        }
        for announcer in &self.announcers {
            announcer(text);
        }
    }

    /// Replace the expression with the arithmetic in a speech transcript.
    /// Returns the expression text that was loaded.
    pub fn load_transcript(&mut self, transcript: &str) -> Result<String, SessionError> {
        let expression = transcript_to_expression(transcript);
        debug!(session = %self.id, %expression, "Loading transcript");
        self.builder.load_expression(&expression)?;
        Ok(expression)
    }
}
