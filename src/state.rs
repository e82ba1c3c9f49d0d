// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parse state: cursor, result stack, suppression counters and diagnostics
//!
//! One [`ParseState`] is created per top-level parse and threaded through
//! every rule evaluation and semantic action. Backtracking is done entirely
//! through [`Position`] snapshots.

use std::fmt;

use thiserror::Error;

use crate::ByteDisplay;

/// Formatted error messages are cut down to this many bytes
pub const MESSAGE_CAPACITY: usize = 512;

/// Lowest tag available for [`Value::User`] results
pub const USER_BASE: u32 = 0x100;

/// Outcome of evaluating a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	/// The rule matched
	Ok,
	/// Hard syntax violation, a diagnostic has been recorded
	Fail,
	/// The rule was legitimately absent
	NoMatch,
}

impl Outcome {
	/// Whether this is [`Outcome::Ok`]
	pub fn is_ok(self) -> bool { self == Self::Ok }
	/// Whether this is [`Outcome::Fail`]
	pub fn is_fail(self) -> bool { self == Self::Fail }
}

/// Snapshot of the cursor and the result stack length
///
/// Restoring a position rewinds consumed input and drops every result
/// produced since it was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
	/// Byte offset into the input
	pub at: usize,
	/// Length of the result stack
	pub results: usize,
}

/// A value produced by a rule onto the result stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'text> {
	Null,
	Bool(bool),
	Char(u8),
	Signed(i64),
	Unsigned(u64),
	Float(f64),
	/// Opaque handle, meaning is up to the grammar
	Pointer(usize),
	/// Span of the input
	Slice(&'text [u8]),
	/// Domain specific value, `tag` starts at [`USER_BASE`]
	User { tag: u32, data: usize },
}

impl<'text> Value<'text> {
	/// The span, if this is a [`Value::Slice`]
	pub fn as_slice(&self) -> Option<&'text [u8]> {
		match *self {
			Self::Slice(slice) => Some(slice),
			_ => None,
		}
	}
	/// Integer value, if it fits an `i64`
	pub fn as_i64(&self) -> Option<i64> {
		match *self {
			Self::Signed(value) => Some(value),
			Self::Unsigned(value) => value.try_into().ok(),
			_ => None,
		}
	}
	/// Numeric value as a float, integers converted
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			Self::Float(value) => Some(value),
			Self::Signed(value) => Some(value as f64),
			Self::Unsigned(value) => Some(value as f64),
			_ => None,
		}
	}
}

/// Why a rule failed
///
/// Reasons only carry static data, they are formatted once the whole parse
/// has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Reason {
	ExpectedChar(u8),
	ExpectedRange(u8, u8),
	ExpectedLiteral(&'static [u8]),
	ExpectedBegin,
	ExpectedEnd,
	ExpectedEmpty,
	ExpectedOpener(u8),
	ExpectedCloser(u8),
	/// Every alternative failed, with the alternation's name if it has one
	NoAlternative(Option<&'static str>),
	Message(&'static str),
}

/// A recorded failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
	/// Byte offset the failure was recorded at
	pub at: usize,
	/// Byte at that offset, `None` at end of input
	pub found: Option<u8>,
	pub reason: Reason,
}

impl fmt::Display for Failure {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.reason {
			Reason::ExpectedChar(ch) => write!(f, "expected {}", ByteDisplay(ch)),
			Reason::ExpectedRange(low, high) => {
				write!(f, "expected within range {}..={}", ByteDisplay(low), ByteDisplay(high))
			}
			Reason::ExpectedLiteral(text) => write!(f, "expected \"{}\"", text.escape_ascii()),
			Reason::ExpectedBegin => f.write_str("expected beginning of input"),
			Reason::ExpectedEnd => f.write_str("expected end of input"),
			Reason::ExpectedEmpty => f.write_str("expected empty input"),
			Reason::ExpectedOpener(ch) => write!(f, "expected bound opener {}", ByteDisplay(ch)),
			Reason::ExpectedCloser(ch) => write!(f, "expected bound closer {}", ByteDisplay(ch)),
			Reason::NoAlternative(Some(name)) => write!(f, "expected {name}"),
			Reason::NoAlternative(None) => f.write_str("expected sub-match"),
			Reason::Message(message) => return f.write_str(message),
		}?;
		match self.found {
			Some(byte) => write!(f, ", found {}", ByteDisplay(byte)),
			None => f.write_str(", found end of input"),
		}
	}
}

/// A failed parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{line}:{column}]: {message}")]
pub struct ParseError {
	/// 1-based line
	pub line: usize,
	/// 1-based byte column
	pub column: usize,
	/// Human readable description, at most [`MESSAGE_CAPACITY`] bytes
	pub message: String,
}

impl ParseError {
	pub(crate) fn new(line: usize, column: usize, message: impl fmt::Display) -> Self {
		let mut message = message.to_string();
		if message.len() > MESSAGE_CAPACITY {
			let mut end = MESSAGE_CAPACITY;
			while !message.is_char_boundary(end) {
				end -= 1;
			}
			message.truncate(end);
		}
		Self { line, column, message }
	}
}

/// Mutable state of one parse
pub struct ParseState<'text, U = ()> {
	input: &'text [u8],
	at: usize,
	results: Vec<Value<'text>>,
	suppress_errors: u32,
	suppress_results: u32,
	line: usize,
	column: usize,
	/// offset `line` and `column` were last brought up to
	synced: usize,
	error: Option<Failure>,
	furthest: Option<Failure>,
	/// Data threaded through semantic actions
	pub user: U,
}

impl<'text> ParseState<'text> {
	/// State without user data
	pub fn from_input(input: &'text [u8]) -> Self { Self::new(input, ()) }
}

impl<'text, U> ParseState<'text, U> {
	pub fn new(input: &'text [u8], user: U) -> Self {
		Self {
			input,
			at: 0,
			results: Vec::new(),
			suppress_errors: 0,
			suppress_results: 0,
			line: 1,
			column: 1,
			synced: 0,
			error: None,
			furthest: None,
			user,
		}
	}
	/// Drop the state, keeping the user data
	pub fn into_user(self) -> U { self.user }

	pub fn input(&self) -> &'text [u8] { self.input }
	/// Unconsumed input
	pub fn rest(&self) -> &'text [u8] { &self.input[self.at..] }
	/// Current byte offset
	pub fn at(&self) -> usize { self.at }
	pub fn is_begin(&self) -> bool { self.at == 0 }
	pub fn is_end(&self) -> bool { self.at == self.input.len() }
	pub fn peek(&self) -> Option<u8> { self.peek_at(0) }
	pub fn peek_at(&self, offset: usize) -> Option<u8> { self.input.get(self.at + offset).copied() }
	/// Consume up to `n` bytes
	pub fn advance(&mut self, n: usize) { self.at = (self.at + n).min(self.input.len()); }
	/// Input consumed since `from`
	pub fn matched(&self, from: Position) -> &'text [u8] { &self.input[from.at.min(self.at)..self.at] }

	pub fn position(&self) -> Position {
		Position {
			at: self.at,
			results: self.results.len(),
		}
	}
	/// Rewind to a snapshot
	pub fn set_position(&mut self, position: Position) {
		self.at = position.at.min(self.input.len());
		self.results.truncate(position.results);
	}

	/// Line of the last successful parse end, 1-based
	pub fn line(&self) -> usize { self.line }
	/// Byte column of the last successful parse end, 1-based
	pub fn column(&self) -> usize { self.column }
	pub(crate) fn sync_location(&mut self) {
		(self.line, self.column) = self.location_of(self.at);
		self.synced = self.at;
	}
	/// Line and column of a byte offset
	pub fn location_of(&self, at: usize) -> (usize, usize) {
		let (mut line, mut column, from) = if at >= self.synced {
			(self.line, self.column, self.synced)
		} else {
			(1, 1, 0)
		};
		for &byte in &self.input[from..at.min(self.input.len())] {
			if byte == b'\n' {
				line += 1;
				column = 1;
			} else {
				column += 1;
			}
		}
		(line, column)
	}

	pub fn results(&self) -> &[Value<'text>] { &self.results }
	/// Results produced since `from`
	pub fn results_since(&self, from: Position) -> &[Value<'text>] {
		&self.results[from.results.min(self.results.len())..]
	}
	/// Last slice produced since `from`
	pub fn slice_since(&self, from: Position) -> Option<&'text [u8]> {
		self.results_since(from).iter().rev().find_map(Value::as_slice)
	}
	pub fn clear_results(&mut self) { self.results.clear(); }
	/// Push a result unless results are suppressed
	pub fn push(&mut self, value: Value<'text>) {
		if self.suppress_results == 0 {
			self.results.push(value);
		}
	}

	pub fn suppress_errors(&mut self) { self.suppress_errors += 1; }
	pub fn unsuppress_errors(&mut self) { self.suppress_errors = self.suppress_errors.saturating_sub(1); }
	pub fn errors_suppressed(&self) -> bool { self.suppress_errors > 0 }
	pub fn suppress_results(&mut self) { self.suppress_results += 1; }
	pub fn unsuppress_results(&mut self) { self.suppress_results = self.suppress_results.saturating_sub(1); }
	pub fn results_suppressed(&self) -> bool { self.suppress_results > 0 }

	pub fn ok(&self) -> Outcome { Outcome::Ok }
	pub fn no_match(&self) -> Outcome { Outcome::NoMatch }
	/// Succeed with a result
	pub fn ok_with(&mut self, value: Value<'text>) -> Outcome {
		self.push(value);
		Outcome::Ok
	}
	/// Succeed, replacing every result produced since `from` with `value`
	pub fn ok_replace(&mut self, from: Position, value: Value<'text>) -> Outcome {
		self.results.truncate(from.results);
		self.ok_with(value)
	}
	/// Succeed, dropping every result produced since `from`
	pub fn ok_truncate(&mut self, from: Position) -> Outcome {
		self.results.truncate(from.results);
		Outcome::Ok
	}
	/// Fail at the cursor
	pub fn fail(&mut self, reason: Reason) -> Outcome { self.fail_at(self.at, reason) }
	/// Fail at a byte offset
	pub fn fail_at(&mut self, at: usize, reason: Reason) -> Outcome {
		let failure = Failure {
			at,
			found: self.input.get(at).copied(),
			reason,
		};
		self.record(failure);
		if !self.errors_suppressed() {
			self.commit(failure);
		}
		Outcome::Fail
	}

	/// The committed diagnostic
	pub fn error(&self) -> Option<&Failure> { self.error.as_ref() }
	/// The furthest failure seen, committed or not
	pub fn furthest(&self) -> Option<&Failure> { self.furthest.as_ref() }
	pub fn clear_errors(&mut self) {
		self.error = None;
		self.furthest = None;
	}
	pub(crate) fn record(&mut self, failure: Failure) {
		if self.furthest.is_none_or(|furthest| failure.at >= furthest.at) {
			self.furthest = Some(failure);
		}
	}
	pub(crate) fn commit(&mut self, failure: Failure) {
		if self.error.is_none_or(|error| failure.at >= error.at) {
			self.error = Some(failure);
		}
	}
	pub(crate) fn take_furthest(&mut self) -> Option<Failure> { self.furthest.take() }
	pub(crate) fn restore_furthest(&mut self, furthest: Option<Failure>) { self.furthest = furthest; }

	/// Describe why the parse failed
	///
	/// Picks the furthest of the committed diagnostic and the furthest failure,
	/// preferring the committed one on a tie.
	pub fn report(&self) -> ParseError {
		let failure = match (self.error, self.furthest) {
			(Some(error), Some(furthest)) if furthest.at > error.at => Some(furthest),
			(Some(error), _) => Some(error),
			(None, furthest) => furthest,
		};
		match failure {
			Some(failure) => {
				let (line, column) = self.location_of(failure.at);
				ParseError::new(line, column, failure)
			}
			None => {
				let (line, column) = self.location_of(self.at);
				ParseError::new(line, column, "syntax error")
			}
		}
	}
}

impl<U: fmt::Debug> fmt::Debug for ParseState<'_, U> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("ParseState")
			.field("at", &self.at)
			.field("len", &self.input.len())
			.field("results", &self.results)
			.field("error", &self.error)
			.field("user", &self.user)
			.finish_non_exhaustive()
	}
}
