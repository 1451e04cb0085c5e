//! Tally: an expression-building calculator core
//!
//! Tally follows the "pure core, imperative shell" split. The core turns
//! keypad actions into an expression string and keeps an immutable-entry
//! history ledger, with no I/O and no timers. Arithmetic is delegated to an
//! external evaluation engine behind the [`evaluation::Evaluator`] trait,
//! reached through the async [`evaluation::EvaluationClient`].
//!
//! # Core Concepts
//!
//! - **Builder**: `ExpressionBuilder`, a small state machine over `BuilderState`
//! - **Guards**: pure predicates deciding whether an input is admitted
//! - **History**: most-recent-first ledger of successful evaluations
//! - **Display**: pure projection of state into display strings
//! - **Session**: one builder, one ledger, stale-response protection
//! - **Currency**: amount conversion against a live rate table
//!
//! # Example
//!
//! ```rust
//! use tally::core::{ExpressionBuilder, Function, Operator, Phase};
//! use tally::display::DisplayProjector;
//!
//! let mut builder = ExpressionBuilder::new();
//! builder.append_digit_or_point('2').unwrap();
//! builder.append_operator(Operator::Add).unwrap();
//! builder.append_function(Function::Sqrt);
//! builder.append_digit_or_point('9').unwrap();
//!
//! assert_eq!(builder.current_expression_text(), "2 + sqrt(9");
//! assert_eq!(builder.phase(), Phase::Composing);
//!
//! // After evaluation the result seeds the next expression.
//! builder.show_result("5");
//! builder.append_operator(Operator::Multiply).unwrap();
//! assert_eq!(builder.current_expression_text(), "5 * ");
//!
//! let frame = DisplayProjector::default().frame(builder.state());
//! assert_eq!(frame.primary, "0");
//! assert_eq!(frame.secondary, "5 * ");
//! ```

pub mod checkpoint;
pub mod config;
pub mod core;
pub mod currency;
pub mod display;
pub mod evaluation;
pub mod session;
pub mod voice;

// Re-export commonly used types
pub use crate::config::CalculatorConfig;
pub use crate::core::{ExpressionBuilder, HistoryEntry, HistoryLedger, Operator, ResultValue};
pub use crate::currency::{CurrencyConverter, RateSource};
pub use crate::evaluation::{EvaluationClient, EvaluationOutcome, Evaluator};
pub use crate::session::{Action, Session};
