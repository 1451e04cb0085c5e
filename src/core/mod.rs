//! Core calculator types and logic.
//!
//! This module contains the pure functional core:
//! - Canonical tokens (`Operator`, `Function`)
//! - Builder state and the expression-assembly state machine
//! - Guard predicates for input admission
//! - The history ledger
//!
//! Nothing in this module performs I/O.

mod builder;
mod error;
mod guard;
mod history;
mod state;
mod token;

pub use builder::ExpressionBuilder;
pub use error::InputRejected;
pub use guard::{evaluable_guard, leading_operator_guard, Guard, OperatorProposal};
pub use history::{HistoryEntry, HistoryLedger, LedgerChange, ResultValue};
pub use state::{BuilderState, Phase, ERROR_SENTINEL};
pub use token::{Function, Operator};
