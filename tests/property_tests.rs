//! Property-based tests for the builder, ledger and projector.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use tally::core::{
    BuilderState, ExpressionBuilder, Function, HistoryLedger, Operator, Phase, ResultValue,
};
use tally::display::DisplayProjector;
use tally::evaluation::EvaluationOutcome;
use tally::session::{Action, Applied, Completion, Session};

#[derive(Clone, Debug)]
enum Input {
    Digit(char),
    Operator(Operator),
    Function(Function),
}

fn arbitrary_operator() -> impl Strategy<Value = Operator> {
    prop::sample::select(vec![
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
        Operator::Power,
        Operator::OpenGroup,
        Operator::CloseGroup,
    ])
}

fn arbitrary_binary_operator() -> impl Strategy<Value = Operator> {
    arbitrary_operator().prop_filter("binary only", |op| op.is_binary())
}

fn arbitrary_digit() -> impl Strategy<Value = char> {
    prop::sample::select("0123456789.".chars().collect::<Vec<_>>())
}

fn arbitrary_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        4 => arbitrary_digit().prop_map(Input::Digit),
        2 => arbitrary_operator().prop_map(Input::Operator),
        1 => prop::sample::select(Function::ALL.to_vec()).prop_map(Input::Function),
    ]
}

/// Reference model of the expression text: canonical tokens concatenated
/// in order, tracking only what decides admission.
#[derive(Default)]
struct Model {
    text: String,
    token: String,
    started: bool,
}

impl Model {
    /// Returns whether the input should be admitted.
    fn push(&mut self, input: &Input) -> bool {
        match input {
            Input::Digit('.') if self.token.contains('.') => return false,
            Input::Digit(ch) => {
                self.text.push(*ch);
                self.token.push(*ch);
            }
            Input::Operator(op) if !self.started && !op.may_lead() => return false,
            Input::Operator(op) => {
                self.text.push_str(&op.token());
                self.token.clear();
            }
            Input::Function(function) => {
                if !self.token.is_empty() {
                    self.text.push_str(" * ");
                }
                self.text.push_str(&function.token());
                self.token.clear();
            }
        }
        self.started = true;
        true
    }
}

fn apply(builder: &mut ExpressionBuilder, input: &Input) -> bool {
    match input {
        Input::Digit(ch) => builder.append_digit_or_point(*ch).is_ok(),
        Input::Operator(op) => builder.append_operator(*op).is_ok(),
        Input::Function(function) => {
            builder.append_function(*function);
            true
        }
    }
}

proptest! {
    #[test]
    fn expression_text_is_concatenation_of_canonical_tokens(
        inputs in prop::collection::vec(arbitrary_input(), 0..40)
    ) {
        let mut builder = ExpressionBuilder::new();
        let mut model = Model::default();

        for input in &inputs {
            let before = builder.state().clone();
            let expected = model.push(input);
            let accepted = apply(&mut builder, input);

            prop_assert_eq!(accepted, expected, "admission differs for {:?}", input);
            if !accepted {
                prop_assert_eq!(builder.state(), &before);
            }
        }

        prop_assert_eq!(builder.current_expression_text(), model.text);
    }

    #[test]
    fn second_decimal_point_is_a_no_op(
        digits in prop::collection::vec(prop::sample::select("0123456789".chars().collect::<Vec<_>>()), 0..8)
    ) {
        let mut builder = ExpressionBuilder::new();
        for digit in &digits {
            builder.append_digit_or_point(*digit).unwrap();
        }

        builder.append_digit_or_point('.').unwrap();
        let after_first = builder.state().clone();

        prop_assert!(builder.append_digit_or_point('.').is_err());
        prop_assert_eq!(builder.state(), &after_first);
    }

    #[test]
    fn result_seeds_next_expression(
        value in -1.0e9f64..1.0e9,
        op in arbitrary_binary_operator(),
    ) {
        let mut session = Session::default();
        session.apply(Action::Digit('1')).unwrap();
        let Applied::EvaluationRequested(ticket) = session.apply(Action::Evaluate).unwrap() else {
            panic!("expected a ticket");
        };
        let outcome = EvaluationOutcome::Success { result: ResultValue::Number(value) };
        let recorded = matches!(session.complete(&ticket, outcome), Completion::Recorded(_));
        prop_assert!(recorded);

        session.apply(Action::Operator(op)).unwrap();

        let expected = format!("{}{}", value, op.token());
        prop_assert_eq!(session.builder().current_expression_text(), expected);
    }

    #[test]
    fn delete_without_current_token_is_a_no_op(
        inputs in prop::collection::vec(arbitrary_input(), 0..20)
    ) {
        let mut builder = ExpressionBuilder::new();
        for input in &inputs {
            apply(&mut builder, input);
        }
        // Leave the current token empty: either nothing typed or an
        // operator just committed it.
        if builder.phase() != Phase::Empty {
            builder.append_operator(Operator::OpenGroup).unwrap();
        }

        let before = builder.state().clone();
        let generation = builder.generation();

        prop_assert!(!builder.delete_last());
        prop_assert_eq!(builder.state(), &before);
        prop_assert_eq!(builder.generation(), generation);
    }

    #[test]
    fn clear_history_always_empties(
        entries in prop::collection::vec(("[0-9]{1,3} [+*/-] [0-9]{1,3}", -1.0e6f64..1.0e6), 0..30)
    ) {
        let mut ledger = HistoryLedger::new();
        for (expression, result) in &entries {
            ledger.record(expression.clone(), ResultValue::Number(*result));
        }
        prop_assert_eq!(ledger.len(), entries.len());

        ledger.clear();

        prop_assert!(ledger.entries().is_empty());
    }

    #[test]
    fn grouping_only_inserts_separators(n in 0u64..100_000_000_000) {
        let projector = DisplayProjector::default();
        let plain = n.to_string();

        let grouped = projector.format_number(&plain);

        prop_assert_eq!(grouped.replace(',', ""), plain);
    }

    #[test]
    fn empty_token_always_displays_zero(committed in "[0-9]{0,4}( [+*/-] )?") {
        let state = BuilderState {
            committed_expression: committed,
            current_token: String::new(),
            pending_reset_on_next_input: false,
        };
        prop_assert_eq!(DisplayProjector::default().frame(&state).primary, "0");
    }
}

#[test]
fn delete_on_fresh_builder_is_a_no_op() {
    let mut builder = ExpressionBuilder::new();
    assert!(!builder.delete_last());
    assert_eq!(builder.state(), &BuilderState::default());
    assert_eq!(builder.generation(), 0);
}
