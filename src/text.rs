// SPDX-License-Identifier: MIT OR Apache-2.0
//! KVS text format: a grammar wired to document mutations, and the printer
//!
//! The reader is an ordinary grammar evaluated by [`crate::engine`]. Its
//! actions build the tree through a builder held as parse user data; a
//! collection is pushed when its opener matches and dropped again if
//! anything inside it fails.

use std::fmt;
use std::mem;
use std::path::Path;
use std::sync::LazyLock;

use thiserror::Error;

use crate::kvs::{Kvs, KvsType, Payload};
use crate::rule::Rule;
use crate::state::{Outcome, ParseError, ParseState, Position, Reason, Value};
use crate::{NameDisplay, QuotedDisplay, atoms, engine, is_ident_byte};

/// Tree under construction
#[derive(Debug, Default)]
struct Builder {
	/// innermost open collection
	current: Kvs,
	/// collections enclosing `current`, outermost first
	open: Vec<Kvs>,
	/// name for the next value
	name: Option<String>,
	/// last decoded string
	scratch: String,
}

impl Builder {
	fn new(root: Kvs) -> Self {
		Self {
			current: root,
			..Self::default()
		}
	}
	fn named(&mut self, kvs: Kvs) -> Kvs {
		match self.name.take() {
			Some(name) => kvs.named(name),
			None => kvs,
		}
	}
	/// Append a finished value to the current collection
	fn emit(&mut self, kvs: Kvs) {
		let kvs = self.named(kvs);
		self.current.push(kvs);
	}
	/// Start a child collection and make it current
	fn open(&mut self, kind: KvsType) {
		let child = self.named(Kvs::with_type(kind));
		let parent = mem::replace(&mut self.current, child);
		self.open.push(parent);
	}
	/// Attach the current collection to its parent
	fn close(&mut self) {
		if let Some(parent) = self.open.pop() {
			let child = mem::replace(&mut self.current, parent);
			self.current.push(child);
		}
	}
	/// Drop the current collection
	fn discard(&mut self) {
		if let Some(parent) = self.open.pop() {
			self.current = parent;
		}
	}
	fn finish(self) -> Kvs {
		match self.open.into_iter().next() {
			Some(root) => root,
			None => self.current,
		}
	}
}

type TextRule = Rule<'static, Builder>;

/// `fluff* (member fluff*)* end`
static DOCUMENT: LazyLock<TextRule> = LazyLock::new(|| {
	Rule::all([
		Rule::func(fluff),
		Rule::all([Rule::lazy(&MEMBER), Rule::func(fluff)]).repeat_or_none(),
		Rule::func(document_end),
	])
	.named("document")
});

/// `name '=' fluff value`
static MEMBER: LazyLock<TextRule> = LazyLock::new(|| {
	let name = Rule::close(Rule::all([string(), atoms::space_maybe(), Rule::char(b'=').test()]), set_name);
	Rule::all([name.named("name"), Rule::func(fluff), Rule::lazy(&VALUE)]).named("member")
});

static VALUE: LazyLock<TextRule> = LazyLock::new(|| {
	Rule::any([
		Rule::close(
			Rule::any([
				delimited(atoms::null()),
				delimited(atoms::boolean()),
				delimited(atoms::f64_any()),
				delimited(atoms::s64_any()),
			]),
			emit_scalar,
		),
		malformed_number(),
		Rule::close(string(), emit_string),
		vector(),
		Rule::func(array_scope),
		Rule::func(node_scope),
	])
	.named("value")
});

/// `'{' fluff* (member fluff*)* '}'`
static NODE_BODY: LazyLock<TextRule> = LazyLock::new(|| {
	Rule::all([
		Rule::char(b'{').test(),
		Rule::func(fluff),
		Rule::all([Rule::lazy(&MEMBER), Rule::func(fluff)]).repeat_or_none(),
		Rule::func(node_end),
	])
});

/// `'[' fluff* (value fluff*)* ']'`
static ARRAY_BODY: LazyLock<TextRule> = LazyLock::new(|| {
	Rule::all([
		Rule::char(b'[').test(),
		Rule::func(fluff),
		Rule::all([Rule::lazy(&VALUE), Rule::func(fluff)]).repeat_or_none(),
		Rule::func(array_end),
	])
});

/// A token that must not run into an identifier
fn delimited(rule: TextRule) -> TextRule { Rule::all([rule, Rule::func(delimiter)]) }

/// Identifier, double-quoted or block string, decoded into the scratch buffer
fn string() -> TextRule {
	let ident_start = || -> [TextRule; 4] { [Rule::range(b'a', b'z'), Rule::range(b'A', b'Z'), Rule::char(b'_'), Rule::range(0x80, 0xFF)] };
	let ident_byte = ident_start().into_iter().chain([Rule::range(b'0', b'9'), Rule::char(b'-')]);
	let identifier = Rule::close(
		Rule::all([Rule::any(ident_start()), Rule::any(ident_byte).repeat_or_none()]).flatten(),
		decode_raw,
	);

	// anything but '"', '\\' and a newline
	let plain = Rule::any([
		Rule::range(0x00, 0x09),
		Rule::range(0x0B, 0x21),
		Rule::range(0x23, 0x5B),
		Rule::range(0x5D, 0xFF),
	]);
	let escape = Rule::all([Rule::char(b'\\'), Rule::range(0x00, 0xFF)]);
	let quoted = Rule::close(
		Rule::all([
			Rule::char(b'"').test(),
			Rule::any([escape, plain]).repeat_or_none().flatten(),
			Rule::func(quoted_end),
		]),
		decode_escaped,
	);

	let block = Rule::close(Rule::all([Rule::literal(b"```").test(), Rule::func(block_body)]), decode_raw);

	Rule::any([identifier, quoted, block]).named("string")
}

/// `'(' fluff* (number fluff*)* ')'`, one to four components
fn vector() -> TextRule {
	let component = Rule::all([
		Rule::any([delimited(atoms::f64_any()), delimited(atoms::s64_any()), malformed_number()]),
		Rule::func(fluff),
	]);
	Rule::close(
		Rule::bounded(b'(', b')', Rule::all([Rule::func(fluff), component.repeat_or_none()])),
		emit_vector,
	)
	.named("vector")
}

/// Anything that starts like a number but did not parse as one
///
/// Consumes the whole token so its failure outranks the partial number
/// matches tried before it.
fn malformed_number() -> TextRule {
	let lead = Rule::any([Rule::range(b'0', b'9'), Rule::char(b'+'), Rule::char(b'-'), Rule::char(b'.')]);
	let tail = Rule::any([
		Rule::range(b'a', b'z'),
		Rule::range(b'A', b'Z'),
		Rule::range(b'0', b'9'),
		Rule::range(0x80, 0xFF),
		Rule::char(b'_'),
		Rule::char(b'-'),
		Rule::char(b'+'),
		Rule::char(b'.'),
	]);
	Rule::close(Rule::all([lead, tail.repeat_or_none()]).flatten(), reject_number)
}

/// Whitespace, separators and comments
fn fluff<U>(state: &mut ParseState<'_, U>, _: Position) -> Outcome {
	loop {
		match state.peek() {
			Some(b' ' | b'\t' | b'\n' | b'\r' | b',' | b';') => state.advance(1),
			Some(b'/') => match state.peek_at(1) {
				Some(b'/') => {
					let rest = state.rest();
					let len = rest.iter().position(|&byte| byte == b'\n').map_or(rest.len(), |at| at + 1);
					state.advance(len);
				}
				Some(b'*') => {
					if block_comment(state).is_fail() {
						return Outcome::Fail;
					}
				}
				_ => return state.fail(Reason::Message("expected comment after '/'")),
			},
			_ => return Outcome::Ok,
		}
	}
}

/// `/* ... */`, nestable
fn block_comment<U>(state: &mut ParseState<'_, U>) -> Outcome {
	let mut depth = 0usize;
	loop {
		match (state.peek(), state.peek_at(1)) {
			(Some(b'/'), Some(b'*')) => {
				depth += 1;
				state.advance(2);
			}
			(Some(b'*'), Some(b'/')) => {
				depth -= 1;
				state.advance(2);
				if depth == 0 {
					return Outcome::Ok;
				}
			}
			(Some(_), _) => state.advance(1),
			(None, _) => return state.fail(Reason::Message("unterminated block comment")),
		}
	}
}

fn delimiter<U>(state: &mut ParseState<'_, U>, _: Position) -> Outcome {
	match state.peek() {
		Some(byte) if is_ident_byte(byte) || byte == b'.' => state.fail(Reason::Message("expected delimiter")),
		_ => Outcome::Ok,
	}
}

fn document_end(state: &mut ParseState<'_, Builder>, _: Position) -> Outcome {
	match state.peek() {
		None => Outcome::Ok,
		Some(b'}') => state.fail(Reason::Message("unbalanced '}' at root level")),
		Some(b']') => state.fail(Reason::Message("unbalanced ']' at root level")),
		Some(b')') => state.fail(Reason::Message("unbalanced ')' at root level")),
		Some(_) => state.fail(Reason::NoAlternative(Some("member"))),
	}
}

fn node_end(state: &mut ParseState<'_, Builder>, _: Position) -> Outcome { collection_end(state, b'}') }
fn array_end(state: &mut ParseState<'_, Builder>, _: Position) -> Outcome { collection_end(state, b']') }
fn collection_end(state: &mut ParseState<'_, Builder>, close: u8) -> Outcome {
	match state.peek() {
		Some(byte) if byte == close => {
			state.advance(1);
			Outcome::Ok
		}
		None => state.fail(Reason::Message("unclosed collection at end of input")),
		Some(_) => state.fail(Reason::ExpectedChar(close)),
	}
}

fn node_scope(state: &mut ParseState<'_, Builder>, _: Position) -> Outcome {
	scope(state, KvsType::Node, b'{', &NODE_BODY)
}
fn array_scope(state: &mut ParseState<'_, Builder>, _: Position) -> Outcome {
	scope(state, KvsType::Array, b'[', &ARRAY_BODY)
}
/// Open a collection around `body`, rolling it back if `body` fails
fn scope(state: &mut ParseState<'_, Builder>, kind: KvsType, open: u8, body: &TextRule) -> Outcome {
	if state.peek() != Some(open) {
		return state.fail(Reason::ExpectedChar(open));
	}
	state.user.open(kind);
	let outcome = engine::evaluate(body, state);
	if outcome == Outcome::Ok {
		state.user.close();
	} else {
		state.user.discard();
	}
	outcome
}

fn quoted_end<U>(state: &mut ParseState<'_, U>, _: Position) -> Outcome {
	match state.peek() {
		Some(b'"') => {
			state.advance(1);
			Outcome::Ok
		}
		Some(b'\n') => state.fail(Reason::Message("unexpected newline in double-quoted string")),
		_ => state.fail(Reason::Message("unterminated double-quoted string")),
	}
}

/// Everything up to the closing backticks
fn block_body<U>(state: &mut ParseState<'_, U>, _: Position) -> Outcome {
	let rest = state.rest();
	match rest.windows(3).position(|window| window == b"```") {
		Some(len) => {
			state.advance(len + 3);
			state.ok_with(Value::Slice(&rest[..len]))
		}
		None => {
			state.advance(rest.len());
			state.fail(Reason::Message("unterminated block string"))
		}
	}
}

/// Copy a string without escapes, as matched
fn decode_raw(state: &mut ParseState<'_, Builder>, from: Position) -> Outcome {
	let raw = state.slice_since(from).unwrap_or_default();
	match std::str::from_utf8(raw) {
		Ok(text) => {
			state.user.scratch.clear();
			state.user.scratch.push_str(text);
			state.ok_truncate(from)
		}
		Err(_) => state.fail(Reason::Message("invalid UTF-8 in string")),
	}
}

fn decode_escaped(state: &mut ParseState<'_, Builder>, from: Position) -> Outcome {
	let raw = state.slice_since(from).unwrap_or_default();
	match String::from_utf8(unescape(raw)) {
		Ok(text) => {
			state.user.scratch = text;
			state.ok_truncate(from)
		}
		Err(_) => state.fail(Reason::Message("invalid UTF-8 in string")),
	}
}

/// Resolve backslash escapes
///
/// `\t`, `\n` and `\r` become control characters, any other escaped byte
/// stands for itself.
fn unescape(raw: &[u8]) -> Vec<u8> {
	let mut escapes = 0;
	let mut bytes = raw.iter();
	while let Some(&byte) = bytes.next() {
		if byte == b'\\' && bytes.next().is_some() {
			escapes += 1;
		}
	}
	let mut text = Vec::with_capacity(raw.len() - escapes);
	let mut bytes = raw.iter().copied();
	while let Some(byte) = bytes.next() {
		if byte != b'\\' {
			text.push(byte);
			continue;
		}
		text.push(match bytes.next() {
			Some(b't') => b'\t',
			Some(b'n') => b'\n',
			Some(b'r') => b'\r',
			Some(byte) => byte,
			None => b'\\',
		});
	}
	text
}

fn set_name(state: &mut ParseState<'_, Builder>, from: Position) -> Outcome {
	state.user.name = Some(mem::take(&mut state.user.scratch));
	state.ok_truncate(from)
}

fn emit_string(state: &mut ParseState<'_, Builder>, from: Position) -> Outcome {
	let text = mem::take(&mut state.user.scratch);
	state.user.emit(Kvs::from(text));
	state.ok_truncate(from)
}

fn emit_scalar(state: &mut ParseState<'_, Builder>, from: Position) -> Outcome {
	let kvs = match state.results_since(from).last().copied() {
		Some(Value::Null) => Kvs::new(),
		Some(Value::Bool(value)) => Kvs::from(value),
		Some(Value::Signed(value)) => Kvs::from(value),
		Some(Value::Float(value)) => Kvs::from(value),
		_ => return state.fail(Reason::Message("expected value")),
	};
	state.user.emit(kvs);
	state.ok_truncate(from)
}

fn emit_vector(state: &mut ParseState<'_, Builder>, from: Position) -> Outcome {
	let len = state.results_since(from).len();
	match len {
		0 => return state.fail(Reason::Message("invalid value: empty vector")),
		5.. => return state.fail(Reason::Message("too many values in vector")),
		_ => {}
	}
	let mut components = [0.0; 4];
	for (component, value) in components.iter_mut().zip(state.results_since(from)) {
		*component = value.as_f64().unwrap_or_default() as f32;
	}
	if !components.iter().all(|component| component.is_finite()) {
		return state.fail(Reason::Message("number out of range"));
	}
	let mut kvs = Kvs::new();
	kvs.set_vector(&components[..len]);
	state.user.emit(kvs);
	state.ok_truncate(from)
}

fn reject_number<U>(state: &mut ParseState<'_, U>, from: Position) -> Outcome {
	let token = state.matched(from);
	if !token.iter().any(u8::is_ascii_digit) {
		return state.fail(Reason::Message("missing numeral part in number"));
	}
	let overflows = std::str::from_utf8(token)
		.ok()
		.and_then(|token| token.parse::<f64>().ok())
		.is_some_and(f64::is_infinite);
	if overflows {
		state.fail(Reason::Message("number out of range"))
	} else {
		state.fail(Reason::Message("malformed number"))
	}
}

/// Read a document into `root`
///
/// `root` becomes a node holding the document's members, keeping its own
/// name. On failure it is left as an empty node. Returns the number of bytes
/// consumed.
pub fn read_text(root: &mut Kvs, input: &[u8]) -> Result<usize, ParseError> {
	let mut document = root.take();
	document.set_type(KvsType::Node);
	document.clear();
	let mut state = ParseState::new(input, Builder::new(document));
	let result = engine::parse(&*DOCUMENT, &mut state);
	*root = state.into_user().finish();
	if result.is_err() {
		root.clear();
	}
	result
}

/// Write canonical text
///
/// Members of a root node (or values of a root array) go one per line.
pub fn write_text(kvs: &Kvs, out: &mut impl fmt::Write) -> fmt::Result {
	match kvs.payload() {
		Payload::Node(children) => {
			for child in children {
				write_member(child, out, 0)?;
				out.write_char('\n')?;
			}
		}
		Payload::Array(children) => {
			for child in children {
				write_value(child, out, 0)?;
				out.write_char('\n')?;
			}
		}
		_ => {
			write_value(kvs, out, 0)?;
			out.write_char('\n')?;
		}
	}
	Ok(())
}

fn write_member(kvs: &Kvs, out: &mut impl fmt::Write, depth: usize) -> fmt::Result {
	write!(out, "{} = ", NameDisplay(kvs.name()))?;
	write_value(kvs, out, depth)
}

fn write_value(kvs: &Kvs, out: &mut impl fmt::Write, depth: usize) -> fmt::Result {
	match kvs.payload() {
		Payload::Null => out.write_str("null"),
		Payload::Integer(value) => write!(out, "{value}"),
		Payload::Decimal(value) => write!(out, "{value:.7}"),
		Payload::Boolean(value) => write!(out, "{value}"),
		Payload::String(value) => write!(out, "{}", QuotedDisplay(value)),
		Payload::Vec1(value) => write_vector(value, out),
		Payload::Vec2(value) => write_vector(value, out),
		Payload::Vec3(value) => write_vector(value, out),
		Payload::Vec4(value) => write_vector(value, out),
		Payload::Array(children) => write_collection(children, out, depth, ['[', ']'], false),
		Payload::Node(children) => write_collection(children, out, depth, ['{', '}'], true),
	}
}

fn write_vector(components: &[f32], out: &mut impl fmt::Write) -> fmt::Result {
	out.write_char('(')?;
	for (i, component) in components.iter().enumerate() {
		if i > 0 {
			out.write_char(' ')?;
		}
		// debug fmt keeps a fraction or exponent, so it reads back as a decimal
		write!(out, "{component:?}")?;
	}
	out.write_char(')')
}

fn write_collection(
	children: &[Kvs],
	out: &mut impl fmt::Write,
	depth: usize,
	[open, close]: [char; 2],
	members: bool,
) -> fmt::Result {
	out.write_char(open)?;
	if children.is_empty() {
		return out.write_char(close);
	}
	out.write_char('\n')?;
	for child in children {
		indent(out, depth + 1)?;
		if members {
			write_member(child, out, depth + 1)?;
		} else {
			write_value(child, out, depth + 1)?;
		}
		out.write_char('\n')?;
	}
	indent(out, depth)?;
	out.write_char(close)
}

fn indent(out: &mut impl fmt::Write, depth: usize) -> fmt::Result {
	for _ in 0..depth {
		out.write_char('\t')?;
	}
	Ok(())
}

/// Failure to read or write a document file
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IoError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("parse error {0}")]
	Parse(#[from] ParseError),
}

/// Read and parse a document file
pub fn read_text_file(path: impl AsRef<Path>) -> Result<Kvs, IoError> {
	let path = path.as_ref();
	let input = std::fs::read(path).inspect_err(|error| log::error!("failed to read {}: {error}", path.display()))?;
	let mut kvs = Kvs::new();
	read_text(&mut kvs, &input).inspect_err(|error| log::error!("failed to parse {}: {error}", path.display()))?;
	Ok(kvs)
}

/// Write a document file as canonical text
pub fn write_text_file(kvs: &Kvs, path: impl AsRef<Path>) -> Result<(), IoError> {
	let path = path.as_ref();
	let mut text = String::new();
	write_text(kvs, &mut text).map_err(|_| std::io::Error::other("formatting failed"))?;
	std::fs::write(path, text).inspect_err(|error| log::error!("failed to write {}: {error}", path.display()))?;
	Ok(())
}
