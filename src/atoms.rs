// SPDX-License-Identifier: MIT OR Apache-2.0
//! Predefined leaf grammars
//!
//! Every atom is generic over the user data type, so they can be dropped
//! into any grammar. Whitespace and sign atoms produce no meaningful
//! results; keyword and numeric atoms replace whatever they matched with a
//! single [`Value`].

use crate::rule::Rule;
use crate::state::{Outcome, ParseState, Position, Reason, Value};

/// One or more spaces, tabs or line breaks
pub fn whitespace<U: 'static>() -> Rule<'static, U> {
	Rule::any([Rule::char(b' '), Rule::char(b'\t'), Rule::char(b'\n'), Rule::char(b'\r')])
		.repeat()
		.test()
		.named("whitespace")
}
pub fn whitespace_maybe<U: 'static>() -> Rule<'static, U> { whitespace().maybe() }

/// One or more spaces or tabs
pub fn space<U: 'static>() -> Rule<'static, U> {
	Rule::any([Rule::char(b' '), Rule::char(b'\t')]).repeat().test().named("space")
}
pub fn space_maybe<U: 'static>() -> Rule<'static, U> { space().maybe() }

/// `null`, producing [`Value::Null`]
pub fn null<U: 'static>() -> Rule<'static, U> { Rule::close(Rule::literal(b"null").test(), ok_null).named("null") }

/// `true` or `false`, producing [`Value::Bool`]
pub fn boolean<U: 'static>() -> Rule<'static, U> {
	Rule::any([
		Rule::close(Rule::literal(b"true").test(), ok_true),
		Rule::close(Rule::literal(b"false").test(), ok_false),
	])
	.named("boolean")
}

/// `-` or `+`, producing [`Value::Char`]
pub fn sign<U: 'static>() -> Rule<'static, U> { Rule::any([Rule::char(b'-'), Rule::char(b'+')]).named("sign") }
pub fn sign_maybe<U: 'static>() -> Rule<'static, U> { sign().maybe() }

pub fn digit_dec<U: 'static>() -> Rule<'static, U> { Rule::range(b'0', b'9') }
pub fn digits_dec<U: 'static>() -> Rule<'static, U> { digit_dec().repeat() }
pub fn digit_hex<U: 'static>() -> Rule<'static, U> {
	Rule::any([Rule::range(b'0', b'9'), Rule::range(b'a', b'f'), Rule::range(b'A', b'F')])
}
pub fn digits_hex<U: 'static>() -> Rule<'static, U> { digit_hex().repeat() }
pub fn digit_oct<U: 'static>() -> Rule<'static, U> { Rule::range(b'0', b'7') }
pub fn digits_oct<U: 'static>() -> Rule<'static, U> { digit_oct().repeat() }

/// Decimal digits, producing [`Value::Unsigned`]
pub fn u64_dec<U: 'static>() -> Rule<'static, U> { Rule::close(digits_dec().flatten(), close_u64::<U, 10>) }

/// `0x` or `0X` and hex digits, producing [`Value::Unsigned`]
pub fn u64_hex<U: 'static>() -> Rule<'static, U> {
	Rule::close(
		Rule::all([
			Rule::any([Rule::literal(b"0x"), Rule::literal(b"0X")]).test(),
			digits_hex().flatten(),
		]),
		close_u64::<U, 16>,
	)
}

/// A leading `0` and octal digits, producing [`Value::Unsigned`]
///
/// A lone `0` is zero.
pub fn u64_oct<U: 'static>() -> Rule<'static, U> {
	Rule::close(
		Rule::all([Rule::char(b'0').test(), digit_oct().repeat_or_none().flatten()]),
		close_u64::<U, 8>,
	)
}

/// Hex, octal or decimal, in that order
pub fn u64_any<U: 'static>() -> Rule<'static, U> { Rule::any([u64_hex(), u64_oct(), u64_dec()]).named("integer") }

/// Optionally signed decimal, producing [`Value::Signed`]
pub fn s64_dec<U: 'static>() -> Rule<'static, U> { Rule::close(Rule::all([sign_maybe(), u64_dec()]), close_s64) }

/// Optionally signed hex, octal or decimal, producing [`Value::Signed`]
pub fn s64_any<U: 'static>() -> Rule<'static, U> { Rule::close(Rule::all([sign_maybe(), u64_any()]), close_s64) }

/// `e` or `E`, an optional sign and digits
pub fn exponent<U: 'static>() -> Rule<'static, U> {
	Rule::all([Rule::any([Rule::char(b'e'), Rule::char(b'E')]), sign_maybe(), digits_dec()])
}

/// `sign? digits '.' digits`, producing [`Value::Float`]
pub fn f64_basic<U: 'static>() -> Rule<'static, U> {
	Rule::close(
		Rule::all([sign_maybe(), digits_dec(), Rule::char(b'.'), digits_dec()]).flatten(),
		close_f64,
	)
}

/// [`f64_basic`] with an optional exponent
pub fn f64_exp<U: 'static>() -> Rule<'static, U> {
	Rule::close(
		Rule::all([sign_maybe(), digits_dec(), Rule::char(b'.'), digits_dec(), exponent().maybe()]).flatten(),
		close_f64,
	)
}

/// Any decimal: `sign? digits? '.' digits exponent?` or `sign? digits exponent`
///
/// A bare integer is not matched.
pub fn f64_any<U: 'static>() -> Rule<'static, U> {
	Rule::close(
		Rule::all([
			sign_maybe(),
			Rule::any([
				Rule::all([digits_dec().maybe(), Rule::char(b'.'), digits_dec(), exponent().maybe()]),
				Rule::all([digits_dec(), exponent()]),
			]),
		])
		.flatten(),
		close_f64,
	)
	.named("decimal")
}

fn ok_null<U>(state: &mut ParseState<'_, U>, _: Position) -> Outcome { state.ok_with(Value::Null) }
fn ok_true<U>(state: &mut ParseState<'_, U>, _: Position) -> Outcome { state.ok_with(Value::Bool(true)) }
fn ok_false<U>(state: &mut ParseState<'_, U>, _: Position) -> Outcome { state.ok_with(Value::Bool(false)) }

fn close_u64<U, const RADIX: u32>(state: &mut ParseState<'_, U>, from: Position) -> Outcome {
	let digits = state.slice_since(from).unwrap_or_default();
	let value = if digits.is_empty() {
		Some(0)
	} else {
		std::str::from_utf8(digits).ok().and_then(|digits| u64::from_str_radix(digits, RADIX).ok())
	};
	match value {
		Some(value) => state.ok_replace(from, Value::Unsigned(value)),
		None => state.fail(Reason::Message("integer out of range")),
	}
}

fn close_s64<U>(state: &mut ParseState<'_, U>, from: Position) -> Outcome {
	let (negative, magnitude) = match *state.results_since(from) {
		[Value::Char(sign), Value::Unsigned(magnitude)] => (sign == b'-', magnitude),
		[Value::Unsigned(magnitude)] => (false, magnitude),
		_ => return state.fail(Reason::Message("expected integer")),
	};
	let value = if negative {
		0i64.checked_sub_unsigned(magnitude)
	} else {
		i64::try_from(magnitude).ok()
	};
	match value {
		Some(value) => state.ok_replace(from, Value::Signed(value)),
		None => state.fail(Reason::Message("integer out of range")),
	}
}

fn close_f64<U>(state: &mut ParseState<'_, U>, from: Position) -> Outcome {
	let text = state.slice_since(from).and_then(|text| std::str::from_utf8(text).ok());
	match text.and_then(|text| text.parse::<f64>().ok()) {
		Some(value) if value.is_finite() => state.ok_replace(from, Value::Float(value)),
		Some(_) => state.fail(Reason::Message("number out of range")),
		None => state.fail(Reason::Message("malformed decimal")),
	}
}
