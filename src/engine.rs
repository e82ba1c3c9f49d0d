// SPDX-License-Identifier: MIT OR Apache-2.0
//! Grammar evaluation
//!
//! [`evaluate`] is the single recursive entry point. Every call snapshots
//! the [`Position`] on entry and restores it unless the rule succeeded, so a
//! failed branch never leaks consumed input or results into its parent.
//!
//! Modifiers wrap the rule in a fixed order: maybe, test, flatten, then
//! repeat.

use crate::rule::{Kind, Mods, Rule};
use crate::state::{Outcome, ParseError, ParseState, Position, Reason, Value};

#[cfg(not(feature = "trace"))]
macro_rules! trace {
	($($arg:tt)*) => {};
}
#[cfg(feature = "trace")]
macro_rules! trace {
	($($arg:tt)*) => { log::trace!($($arg)*) };
}

/// Evaluate a rule at the current position
pub fn evaluate<U: 'static>(rule: &Rule<'_, U>, state: &mut ParseState<'_, U>) -> Outcome {
	let from = state.position();
	trace!("enter {rule} at {}", from.at);
	let outcome = apply(rule, rule.mods(), state, from);
	if outcome != Outcome::Ok {
		state.set_position(from);
	}
	trace!("leave {rule} at {} with {outcome:?}", state.at());
	outcome
}

fn apply<'text, U: 'static>(rule: &Rule<'_, U>, mods: Mods, state: &mut ParseState<'text, U>, from: Position) -> Outcome {
	if mods.contains(Mods::MAYBE) {
		state.suppress_errors();
		let outcome = apply(rule, mods.without(Mods::MAYBE), state, from);
		state.unsuppress_errors();
		return match outcome {
			Outcome::Fail => {
				state.set_position(from);
				Outcome::NoMatch
			}
			outcome => outcome,
		};
	}
	if mods.contains(Mods::TEST) {
		state.suppress_results();
		let outcome = apply(rule, mods.without(Mods::TEST), state, from);
		state.unsuppress_results();
		return outcome;
	}
	if mods.contains(Mods::FLATTEN) {
		state.suppress_results();
		let outcome = apply(rule, mods.without(Mods::FLATTEN), state, from);
		state.unsuppress_results();
		if outcome == Outcome::Ok {
			let slice = state.matched(from);
			state.push(Value::Slice(slice));
		}
		return outcome;
	}
	if mods.contains(Mods::REPEAT_OR_NONE) {
		state.suppress_errors();
		let outcome = repeat(rule, mods.without(Mods::REPEAT_OR_NONE | Mods::REPEAT), state, from);
		state.unsuppress_errors();
		return match outcome {
			Outcome::Fail => {
				state.set_position(from);
				Outcome::NoMatch
			}
			outcome => outcome,
		};
	}
	if mods.contains(Mods::REPEAT) {
		return repeat(rule, mods.without(Mods::REPEAT), state, from);
	}
	match_kind(rule, state, from)
}

/// One required iteration, then as many as match
fn repeat<U: 'static>(rule: &Rule<'_, U>, mods: Mods, state: &mut ParseState<'_, U>, from: Position) -> Outcome {
	let first = apply(rule, mods, state, from);
	if first != Outcome::Ok {
		return first;
	}
	state.suppress_errors();
	loop {
		let before = state.position();
		match apply(rule, mods, state, before) {
			// an empty match would repeat forever
			Outcome::Ok if state.at() > before.at => {}
			Outcome::Ok => break,
			Outcome::Fail | Outcome::NoMatch => {
				state.set_position(before);
				break;
			}
		}
	}
	state.unsuppress_errors();
	Outcome::Ok
}

fn match_kind<'text, U: 'static>(rule: &Rule<'_, U>, state: &mut ParseState<'text, U>, from: Position) -> Outcome {
	match rule.kind() {
		Kind::Nothing => Outcome::Ok,
		Kind::Begin => {
			if state.is_begin() {
				Outcome::Ok
			} else {
				state.fail(Reason::ExpectedBegin)
			}
		}
		Kind::End => {
			if state.is_end() {
				Outcome::Ok
			} else {
				state.fail(Reason::ExpectedEnd)
			}
		}
		Kind::Empty => {
			if state.is_begin() && state.is_end() {
				Outcome::Ok
			} else {
				state.fail(Reason::ExpectedEmpty)
			}
		}
		&Kind::Char(ch) => match state.peek() {
			Some(byte) if byte == ch => {
				state.advance(1);
				state.ok_with(Value::Char(byte))
			}
			_ => state.fail(Reason::ExpectedChar(ch)),
		},
		&Kind::Range(low, high) => match state.peek() {
			Some(byte) if (low..=high).contains(&byte) => {
				state.advance(1);
				state.ok_with(Value::Char(byte))
			}
			_ => state.fail(Reason::ExpectedRange(low, high)),
		},
		&Kind::Literal(text) => {
			if state.rest().starts_with(text) {
				state.advance(text.len());
				let slice = state.matched(from);
				state.ok_with(Value::Slice(slice))
			} else {
				state.fail(Reason::ExpectedLiteral(text))
			}
		}
		Kind::Bounded { open, close, inner } => {
			if state.peek() != Some(*open) {
				return state.fail(Reason::ExpectedOpener(*open));
			}
			state.advance(1);
			if evaluate(inner, state) == Outcome::Fail {
				return Outcome::Fail;
			}
			if state.peek() != Some(*close) {
				return state.fail(Reason::ExpectedCloser(*close));
			}
			state.advance(1);
			Outcome::Ok
		}
		Kind::Any(children) => alternation(rule, children, state, from),
		Kind::All(children) => {
			let mut outcome = Outcome::NoMatch;
			for child in children {
				match evaluate(child, state) {
					Outcome::Ok => outcome = Outcome::Ok,
					Outcome::NoMatch => {}
					Outcome::Fail => return Outcome::Fail,
				}
			}
			outcome
		}
		Kind::Ref(link) => evaluate(link.get(), state),
		Kind::Func(func) => func(state, from),
		Kind::Close(inner, action) => match evaluate(inner, state) {
			Outcome::Ok if !state.results_suppressed() => action(state, from),
			outcome => outcome,
		},
	}
}

/// Ordered choice, the only intentional choice point
///
/// Attempts run with errors suppressed. If all of them fail, the furthest
/// failure among them is committed, unless no attempt got past the start of
/// a named alternation, which then reports itself.
fn alternation<U: 'static>(rule: &Rule<'_, U>, children: &[Rule<'_, U>], state: &mut ParseState<'_, U>, from: Position) -> Outcome {
	let outer = state.take_furthest();
	state.suppress_errors();
	let mut outcome = Outcome::Fail;
	for child in children {
		if evaluate(child, state) == Outcome::Ok {
			outcome = Outcome::Ok;
			break;
		}
		state.set_position(from);
	}
	state.unsuppress_errors();
	let inner = state.take_furthest();
	state.restore_furthest(outer);
	if let Some(inner) = inner {
		state.record(inner);
	}
	if outcome == Outcome::Ok {
		return outcome;
	}
	match inner {
		Some(inner) if inner.at > from.at || rule.name().is_none() => {
			if !state.errors_suppressed() {
				state.commit(inner);
			}
			Outcome::Fail
		}
		_ => state.fail_at(from.at, Reason::NoAlternative(rule.name())),
	}
}

/// Parse from the current position
///
/// Results and diagnostics are cleared first. On success (including a
/// top-level no-match) the line and column are brought up to date and the
/// number of consumed bytes is returned.
pub fn parse<U: 'static>(rule: &Rule<'_, U>, state: &mut ParseState<'_, U>) -> Result<usize, ParseError> {
	drive(state, |state| evaluate(rule, state))
}

/// [`parse`] without producing results
pub fn test<U: 'static>(rule: &Rule<'_, U>, state: &mut ParseState<'_, U>) -> Result<usize, ParseError> {
	state.suppress_results();
	let result = parse(rule, state);
	state.unsuppress_results();
	result
}

/// [`test`], requiring the rule to span the whole input
pub fn test_whole<U: 'static>(rule: &Rule<'_, U>, state: &mut ParseState<'_, U>) -> Result<usize, ParseError> {
	state.suppress_results();
	let result = drive(state, |state| {
		let from = state.position();
		let outcome = whole(rule, state);
		if outcome != Outcome::Ok {
			state.set_position(from);
		}
		outcome
	});
	state.unsuppress_results();
	result
}

/// Begin, the rule, then end, without building a wrapping rule
fn whole<U: 'static>(rule: &Rule<'_, U>, state: &mut ParseState<'_, U>) -> Outcome {
	if !state.is_begin() {
		return state.fail(Reason::ExpectedBegin);
	}
	if evaluate(rule, state) == Outcome::Fail {
		return Outcome::Fail;
	}
	if !state.is_end() {
		return state.fail(Reason::ExpectedEnd);
	}
	Outcome::Ok
}

fn drive<'text, U>(
	state: &mut ParseState<'text, U>,
	body: impl FnOnce(&mut ParseState<'text, U>) -> Outcome,
) -> Result<usize, ParseError> {
	state.clear_results();
	state.clear_errors();
	let start = state.at();
	match body(state) {
		Outcome::Ok | Outcome::NoMatch => {
			state.sync_location();
			Ok(state.at() - start)
		}
		Outcome::Fail => {
			let error = state.report();
			log::debug!("parse failed: {error}");
			Err(error)
		}
	}
}

/// Parse a whole byte slice with fresh state
///
/// Returns the state so results and user data can be read back.
pub fn parse_slice<'text, U: 'static>(
	rule: &Rule<'_, U>,
	input: &'text [u8],
	user: U,
) -> Result<ParseState<'text, U>, ParseError> {
	let mut state = ParseState::new(input, user);
	parse(rule, &mut state)?;
	Ok(state)
}
