// SPDX-License-Identifier: MIT OR Apache-2.0
use proptest::prelude::*;

use crate::atoms;
use crate::engine::parse;
use crate::rule::Rule;
use crate::state::{ParseState, Value};

fn run<'text>(rule: &Rule<'_>, input: &'text str) -> Result<(usize, Vec<Value<'text>>), String> {
	let mut state = ParseState::from_input(input.as_bytes());
	let len = parse(rule, &mut state).map_err(|error| error.to_string())?;
	Ok((len, state.results().to_vec()))
}

/// The single value a number atom produced
fn value<'text>(rule: &Rule<'_>, input: &'text str) -> Value<'text> {
	match run(rule, input) {
		Ok((len, values)) if len == input.len() && values.len() == 1 => values[0],
		other => panic!("{input:?} gave {other:?}"),
	}
}

#[test]
fn whitespace() {
	assert_eq!(run(&atoms::whitespace(), " \t\r\nx"), Ok((4, vec![])));
	assert_eq!(run(&atoms::whitespace(), "x"), Err("[1:1]: expected whitespace, found 'x'".into()));
	assert_eq!(run(&atoms::whitespace_maybe(), "x"), Ok((0, vec![])));
	assert_eq!(run(&atoms::space(), " \t\n"), Ok((2, vec![])));
	assert!(run(&atoms::space(), "\n").is_err());
	assert_eq!(run(&atoms::space_maybe(), "\n"), Ok((0, vec![])));
}

#[test]
fn keywords() {
	assert_eq!(run(&atoms::null(), "null"), Ok((4, vec![Value::Null])));
	assert_eq!(run(&atoms::null(), "nul"), Err("[1:1]: expected \"null\", found 'n'".into()));
	assert_eq!(value(&atoms::boolean(), "true"), Value::Bool(true));
	assert_eq!(value(&atoms::boolean(), "false"), Value::Bool(false));
	assert_eq!(run(&atoms::boolean(), "nope"), Err("[1:1]: expected boolean, found 'n'".into()));
}

#[test]
fn sign() {
	assert_eq!(value(&atoms::sign(), "-"), Value::Char(b'-'));
	assert_eq!(value(&atoms::sign(), "+"), Value::Char(b'+'));
	assert_eq!(run(&atoms::sign_maybe(), "1"), Ok((0, vec![])));
}

#[test]
fn digits() {
	assert_eq!(run(&atoms::digits_dec(), "0123456789a").map(|(len, _)| len), Ok(10));
	assert_eq!(run(&atoms::digits_hex(), "09afAFg").map(|(len, _)| len), Ok(6));
	assert_eq!(run(&atoms::digits_oct(), "012345678").map(|(len, _)| len), Ok(8));
	assert!(run(&atoms::digit_oct(), "8").is_err());
}

#[test]
fn unsigned_decimal() {
	assert_eq!(value(&atoms::u64_dec(), "1234"), Value::Unsigned(1234));
	assert_eq!(value(&atoms::u64_dec(), "18446744073709551615"), Value::Unsigned(u64::MAX));
	assert_eq!(
		run(&atoms::u64_dec(), "18446744073709551616"),
		Err("[1:21]: integer out of range".into())
	);
}

#[test]
fn unsigned_hex() {
	assert_eq!(value(&atoms::u64_hex(), "0x1F"), Value::Unsigned(31));
	assert_eq!(value(&atoms::u64_hex(), "0XfF"), Value::Unsigned(255));
	assert_eq!(
		run(&atoms::u64_hex(), "0x"),
		Err("[1:3]: expected within range 'A'..='F', found end of input".into())
	);
}

#[test]
fn unsigned_octal() {
	assert_eq!(value(&atoms::u64_oct(), "017"), Value::Unsigned(15));
	assert_eq!(value(&atoms::u64_oct(), "0"), Value::Unsigned(0));
	assert_eq!(run(&atoms::u64_oct(), "08"), Ok((1, vec![Value::Unsigned(0)])));
}

#[test]
fn unsigned_any() {
	assert_eq!(value(&atoms::u64_any(), "0x10"), Value::Unsigned(16));
	assert_eq!(value(&atoms::u64_any(), "010"), Value::Unsigned(8));
	assert_eq!(value(&atoms::u64_any(), "10"), Value::Unsigned(10));
	assert_eq!(value(&atoms::u64_any(), "0"), Value::Unsigned(0));
	assert_eq!(run(&atoms::u64_any(), "x"), Err("[1:1]: expected integer, found 'x'".into()));
}

#[test]
fn signed() {
	assert_eq!(value(&atoms::s64_dec(), "-42"), Value::Signed(-42));
	assert_eq!(value(&atoms::s64_dec(), "+7"), Value::Signed(7));
	assert_eq!(value(&atoms::s64_dec(), "42"), Value::Signed(42));
	assert_eq!(value(&atoms::s64_dec(), "-9223372036854775808"), Value::Signed(i64::MIN));
	assert_eq!(
		run(&atoms::s64_dec(), "9223372036854775808"),
		Err("[1:20]: integer out of range".into())
	);
	assert!(run(&atoms::s64_dec(), "-").is_err());

	assert_eq!(value(&atoms::s64_any(), "-0x10"), Value::Signed(-16));
	assert_eq!(value(&atoms::s64_any(), "-010"), Value::Signed(-8));
	assert_eq!(value(&atoms::s64_any(), "+0"), Value::Signed(0));
}

#[test]
fn decimals() {
	assert_eq!(value(&atoms::f64_basic(), "1.5"), Value::Float(1.5));
	assert_eq!(value(&atoms::f64_basic(), "-0.25"), Value::Float(-0.25));
	assert_eq!(
		run(&atoms::f64_basic(), "1."),
		Err("[1:3]: expected within range '0'..='9', found end of input".into())
	);
	assert_eq!(run(&atoms::f64_basic(), "1"), Err("[1:2]: expected '.', found end of input".into()));

	assert_eq!(value(&atoms::f64_exp(), "1.5e3"), Value::Float(1500.0));
	assert_eq!(value(&atoms::f64_exp(), "2.0E-1"), Value::Float(0.2));
	assert_eq!(run(&atoms::f64_exp(), "1.5e"), Ok((3, vec![Value::Float(1.5)])));

	assert_eq!(value(&atoms::f64_any(), ".5"), Value::Float(0.5));
	assert_eq!(value(&atoms::f64_any(), "1e3"), Value::Float(1000.0));
	assert_eq!(value(&atoms::f64_any(), "-.5e-1"), Value::Float(-0.05));
	assert!(run(&atoms::f64_any(), "1").is_err_and(|error| error.starts_with("[1:2]")));
	assert!(run(&atoms::f64_any(), ".").is_err());

	assert_eq!(run(&atoms::f64_any(), "1e999"), Err("[1:6]: number out of range".into()));
	assert_eq!(run(&atoms::f64_exp(), "-1.0e400"), Err("[1:9]: number out of range".into()));
	assert_eq!(value(&atoms::f64_any(), "1e308"), Value::Float(1e308));
}

#[test]
fn value_conversions() {
	assert_eq!(Value::Unsigned(7).as_i64(), Some(7));
	assert_eq!(Value::Unsigned(u64::MAX).as_i64(), None);
	assert_eq!(Value::Signed(-2).as_f64(), Some(-2.0));
	assert_eq!(Value::Bool(true).as_f64(), None);
	assert_eq!(Value::Null.as_slice(), None);
	assert_eq!(Value::Slice(b"ab").as_slice(), Some(&b"ab"[..]));
	assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
	assert_eq!(Value::Float(0.5).as_i64(), None);
}

proptest! {
	#[test]
	fn any_i64_reads_back(n: i64) {
		let text = n.to_string();
		prop_assert_eq!(value(&atoms::s64_dec(), &text), Value::Signed(n));
	}

	#[test]
	fn any_u64_reads_back_as_hex(n: u64) {
		let text = format!("{n:#x}");
		prop_assert_eq!(value(&atoms::u64_hex(), &text), Value::Unsigned(n));
	}

	#[test]
	fn any_finite_f64_reads_back(n in -1e12f64..1e12) {
		let text = format!("{n:e}");
		prop_assert_eq!(value(&atoms::f64_any(), &text), Value::Float(n));
	}
}
