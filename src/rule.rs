// SPDX-License-Identifier: MIT OR Apache-2.0
//! Grammar representation
//!
//! A grammar is a tree of immutable [`Rule`]s, built once and evaluated any
//! number of times by [`crate::engine`]. Combinators own their children;
//! shared or recursive rules are reached through [`Rule::reference`] or
//! [`Rule::lazy`], the latter allowing mutually recursive `static` grammars:
//!
//! ```
//! use std::sync::LazyLock;
//! use kvlite::{Rule, ParseState, parse};
//!
//! // list = '(' list* ')'
//! static LIST: LazyLock<Rule<'static>> = LazyLock::new(|| {
//! 	Rule::all([
//! 		Rule::char(b'('),
//! 		Rule::lazy(&LIST).repeat_or_none(),
//! 		Rule::char(b')'),
//! 	])
//! });
//!
//! let mut state = ParseState::from_input(b"(()(()))");
//! assert_eq!(parse(&*LIST, &mut state), Ok(8));
//! ```

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::LazyLock;

use crate::ByteDisplay;
use crate::state::{Outcome, ParseState, Position};

/// Native callback: semantic actions and hand-written leaves
///
/// Receives the position captured before the rule started matching.
pub type Action<U> = for<'text> fn(&mut ParseState<'text, U>, Position) -> Outcome;

/// Set of modifiers applied around a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Mods(u8);

impl Mods {
	pub const NONE: Self = Self(0);
	/// Failure becomes [`Outcome::NoMatch`] and records no error
	pub const MAYBE: Self = Self(1 << 0);
	/// Lookahead only: results are suppressed, the cursor still advances
	pub const TEST: Self = Self(1 << 1);
	/// Results are replaced by a single slice of the matched input
	pub const FLATTEN: Self = Self(1 << 2);
	/// One or more
	pub const REPEAT: Self = Self(1 << 3);
	/// Zero or more, nothing matched is [`Outcome::NoMatch`]
	pub const REPEAT_OR_NONE: Self = Self(1 << 4);

	pub const fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }
	pub const fn without(self, other: Self) -> Self { Self(self.0 & !other.0) }
	pub const fn is_empty(self) -> bool { self.0 == 0 }
}

impl BitOr for Mods {
	type Output = Self;
	fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}
impl BitOrAssign for Mods {
	fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

impl fmt::Display for Mods {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		const NAMES: [(Mods, &str); 5] = [
			(Mods::MAYBE, "maybe"),
			(Mods::TEST, "test"),
			(Mods::FLATTEN, "flatten"),
			(Mods::REPEAT, "repeat"),
			(Mods::REPEAT_OR_NONE, "repeat_or_none"),
		];
		let mut first = true;
		for (flag, name) in NAMES {
			if self.contains(flag) {
				if !first {
					f.write_str("|")?;
				}
				f.write_str(name)?;
				first = false;
			}
		}
		Ok(())
	}
}

/// Target of a [`Kind::Ref`]
pub enum Link<'g, U: 'static> {
	Rule(&'g Rule<'g, U>),
	Lazy(&'g LazyLock<Rule<'static, U>>),
}

impl<'g, U: 'static> Link<'g, U> {
	pub fn get(&self) -> &'g Rule<'g, U> {
		match *self {
			Self::Rule(rule) => rule,
			Self::Lazy(rule) => LazyLock::force(rule),
		}
	}
}

/// What a rule matches
pub enum Kind<'g, U: 'static> {
	/// Always succeeds, consumes nothing
	Nothing,
	/// Start of input
	Begin,
	/// End of input
	End,
	/// Start and end of input at once
	Empty,
	/// One byte
	Char(u8),
	/// One byte in an inclusive range
	Range(u8, u8),
	/// Exact byte string
	Literal(&'static [u8]),
	/// `open`, then `inner`, then `close`
	Bounded { open: u8, close: u8, inner: Box<Rule<'g, U>> },
	/// First child that succeeds
	Any(Vec<Rule<'g, U>>),
	/// Every child in order
	All(Vec<Rule<'g, U>>),
	/// Another rule, evaluated indirectly
	Ref(Link<'g, U>),
	/// Native leaf
	Func(Action<U>),
	/// Inner rule, then an action on success
	Close(Box<Rule<'g, U>>, Action<U>),
}

/// One node of a grammar
pub struct Rule<'g, U: 'static = ()> {
	name: Option<&'static str>,
	mods: Mods,
	kind: Kind<'g, U>,
}

impl<'g, U: 'static> Rule<'g, U> {
	pub const fn new(kind: Kind<'g, U>) -> Self {
		Self {
			name: None,
			mods: Mods::NONE,
			kind,
		}
	}
	pub const fn nothing() -> Self { Self::new(Kind::Nothing) }
	pub const fn begin() -> Self { Self::new(Kind::Begin) }
	pub const fn end() -> Self { Self::new(Kind::End) }
	pub const fn empty() -> Self { Self::new(Kind::Empty) }
	pub const fn char(ch: u8) -> Self { Self::new(Kind::Char(ch)) }
	pub const fn range(low: u8, high: u8) -> Self { Self::new(Kind::Range(low, high)) }
	pub const fn literal(text: &'static [u8]) -> Self { Self::new(Kind::Literal(text)) }
	pub fn bounded(open: u8, close: u8, inner: Self) -> Self {
		Self::new(Kind::Bounded {
			open,
			close,
			inner: Box::new(inner),
		})
	}
	pub fn any(children: impl IntoIterator<Item = Self>) -> Self { Self::new(Kind::Any(children.into_iter().collect())) }
	pub fn all(children: impl IntoIterator<Item = Self>) -> Self { Self::new(Kind::All(children.into_iter().collect())) }
	pub const fn reference(rule: &'g Rule<'g, U>) -> Self { Self::new(Kind::Ref(Link::Rule(rule))) }
	/// Reference to a lazily built rule, not forced until evaluated
	pub const fn lazy(rule: &'g LazyLock<Rule<'static, U>>) -> Self { Self::new(Kind::Ref(Link::Lazy(rule))) }
	pub const fn func(func: Action<U>) -> Self { Self::new(Kind::Func(func)) }
	pub fn close(inner: Self, action: Action<U>) -> Self { Self::new(Kind::Close(Box::new(inner), action)) }

	/// Label used in diagnostics and traces
	pub fn named(mut self, name: &'static str) -> Self {
		self.name = Some(name);
		self
	}
	pub fn with(mut self, mods: Mods) -> Self {
		self.mods |= mods;
		self
	}
	pub fn maybe(self) -> Self { self.with(Mods::MAYBE) }
	pub fn test(self) -> Self { self.with(Mods::TEST) }
	pub fn flatten(self) -> Self { self.with(Mods::FLATTEN) }
	pub fn repeat(self) -> Self { self.with(Mods::REPEAT) }
	pub fn repeat_or_none(self) -> Self { self.with(Mods::REPEAT_OR_NONE) }

	pub fn name(&self) -> Option<&'static str> { self.name }
	pub fn mods(&self) -> Mods { self.mods }
	pub fn kind(&self) -> &Kind<'g, U> { &self.kind }
}

/// Short label: the name if any, else the kind
impl<U: 'static> fmt::Display for Rule<'_, U> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		if let Some(name) = self.name {
			f.write_str(name)?;
		} else {
			match &self.kind {
				Kind::Nothing => f.write_str("nothing"),
				Kind::Begin => f.write_str("begin"),
				Kind::End => f.write_str("end"),
				Kind::Empty => f.write_str("empty"),
				Kind::Char(ch) => write!(f, "{}", ByteDisplay(*ch)),
				Kind::Range(low, high) => write!(f, "{}..={}", ByteDisplay(*low), ByteDisplay(*high)),
				Kind::Literal(text) => write!(f, "\"{}\"", text.escape_ascii()),
				Kind::Bounded { open, close, .. } => write!(f, "bounded {}{}", ByteDisplay(*open), ByteDisplay(*close)),
				Kind::Any(children) => write!(f, "any[{}]", children.len()),
				Kind::All(children) => write!(f, "all[{}]", children.len()),
				Kind::Ref(link) => match link.get().name {
					Some(name) => write!(f, "ref {name}"),
					None => f.write_str("ref"),
				},
				Kind::Func(_) => f.write_str("func"),
				Kind::Close(inner, _) => write!(f, "close {inner}"),
			}?;
		}
		if !self.mods.is_empty() {
			write!(f, " ({})", self.mods)?;
		}
		Ok(())
	}
}

impl<U: 'static> fmt::Debug for Rule<'_, U> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let mut debug = f.debug_struct("Rule");
		if let Some(name) = self.name {
			debug.field("name", &name);
		}
		if !self.mods.is_empty() {
			debug.field("mods", &self.mods);
		}
		match &self.kind {
			Kind::Bounded { open, close, inner } => debug
				.field("open", &char::from(*open))
				.field("close", &char::from(*close))
				.field("inner", inner),
			Kind::Any(children) => debug.field("any", children),
			Kind::All(children) => debug.field("all", children),
			Kind::Close(inner, _) => debug.field("close", inner),
			// labels only, references may be recursive
			_ => debug.field("kind", &self.to_string()),
		};
		debug.finish()
	}
}
