// SPDX-License-Identifier: MIT OR Apache-2.0
//! Small backtracking grammar engine, and the KVS document format built on it
//!
//! The crate is split in two halves:
//! - a grammar/combinator interpreter ([`rule`], [`engine`], [`state`]) with
//!   explicit backtracking, modifiers and semantic actions, plus a library of
//!   reusable leaf grammars in [`atoms`]
//! - the KVS hierarchical document model ([`kvs`]) and its text format
//!   ([`text`]), whose reader is itself a grammar evaluated by the engine
//!
//! ```
//! use kvlite::Kvs;
//!
//! let doc = Kvs::parse("size = (640 480)\nname = window").unwrap();
//! assert_eq!(doc.find("name").and_then(Kvs::string), Some("window"));
//! assert_eq!(doc.to_string(), "size = (640.0 480.0)\nname = \"window\"\n");
//! ```
//!
//! ## Text format
//!
//! A document is a list of `name = value` members. Values are `null`,
//! `true`/`false`, integers (`12`, `-0x1F`, `017`), decimals (`1.5`, `.5`,
//! `1e3`), strings (`bare`, `"quoted\t"`, ` ```block``` `), numeric vectors of
//! one to four components (`(0 1 2)`), arrays (`[1 2 3]`) and nodes
//! (`{a = 1}`). Whitespace, commas, semicolons and `//`/`/* */` comments are
//! interchangeable separators.

use std::fmt;

pub mod atoms;
pub mod engine;
pub mod kvs;
pub mod rule;
pub mod state;
pub mod text;

#[cfg(test)]
mod tests;

pub use engine::{evaluate, parse, test, test_whole};
pub use kvs::{Kvs, KvsType, hash_name};
pub use rule::{Kind, Mods, Rule};
pub use state::{Outcome, ParseError, ParseState, Position, Value};
pub use text::{IoError, read_text, read_text_file, write_text, write_text_file};

/// `identifier-start`
fn is_ident_start(byte: u8) -> bool {
	matches!(byte, b'a'..=b'z' | b'A'..=b'Z' | b'_' | 0x80..=0xFF)
}

/// `identifier-char`
fn is_ident_byte(byte: u8) -> bool {
	is_ident_start(byte) || matches!(byte, b'0'..=b'9' | b'-')
}

/// A single input byte, quoted and escaped
struct ByteDisplay(u8);
impl fmt::Display for ByteDisplay {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "'{}'", self.0.escape_ascii()) }
}

/// Writes a string double-quoted, escaping what the reader unescapes
struct QuotedDisplay<'text>(&'text str);
impl fmt::Display for QuotedDisplay<'_> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str("\"")?;
		let mut rest = self.0;
		while let Some(at) = rest.find(['\t', '\n', '\r', '\\', '"']) {
			f.write_str(&rest[..at])?;
			f.write_str(match rest.as_bytes()[at] {
				b'\t' => "\\t",
				b'\n' => "\\n",
				b'\r' => "\\r",
				b'\\' => "\\\\",
				_ => "\\\"",
			})?;
			rest = &rest[at + 1..];
		}
		f.write_str(rest)?;
		f.write_str("\"")
	}
}

/// Writes a member name bare when it reads back as an identifier
struct NameDisplay<'text>(&'text str);
impl fmt::Display for NameDisplay<'_> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let text = self.0.as_bytes();
		let bare = match text.split_first() {
			Some((&first, rest)) => is_ident_start(first) && rest.iter().all(|&byte| is_ident_byte(byte)),
			None => false,
		};
		if bare {
			f.write_str(self.0)
		} else {
			fmt::Display::fmt(&QuotedDisplay(self.0), f)
		}
	}
}
