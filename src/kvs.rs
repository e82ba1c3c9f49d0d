// SPDX-License-Identifier: MIT OR Apache-2.0
//! The KVS document tree, start at [`Kvs`]
//!
//! A [`Kvs`] is a dynamically typed node: it carries an optional name and one
//! value, which is either a scalar, a string, a small numeric vector, or a
//! collection of child nodes. Arrays hold anonymous children, nodes hold
//! named members.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::state::ParseError;
use crate::text;

/// Hash a name with 32-bit FNV-1a
///
/// The empty name hashes to 0.
pub const fn hash_name(name: &str) -> u32 {
	const OFFSET: u32 = 0x811c_9dc5;
	const PRIME: u32 = 0x0100_0193;
	let bytes = name.as_bytes();
	if bytes.is_empty() {
		return 0;
	}
	let mut hash = OFFSET;
	let mut i = 0;
	while i < bytes.len() {
		hash ^= bytes[i] as u32;
		hash = hash.wrapping_mul(PRIME);
		i += 1;
	}
	hash
}

/// The type tag of a [`Kvs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KvsType {
	#[default]
	Null,
	Integer,
	Decimal,
	Boolean,
	String,
	Vec1,
	Vec2,
	Vec3,
	Vec4,
	Array,
	Node,
}

impl KvsType {
	pub fn is_vector(self) -> bool { matches!(self, Self::Vec1 | Self::Vec2 | Self::Vec3 | Self::Vec4) }
	pub fn is_collection(self) -> bool { matches!(self, Self::Array | Self::Node) }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum Payload {
	#[default]
	Null,
	Integer(i64),
	Decimal(f64),
	Boolean(bool),
	String(String),
	Vec1([f32; 1]),
	Vec2([f32; 2]),
	Vec3([f32; 3]),
	Vec4([f32; 4]),
	Array(Vec<Kvs>),
	Node(Vec<Kvs>),
}

impl Payload {
	fn new(kind: KvsType) -> Self {
		match kind {
			KvsType::Null => Self::Null,
			KvsType::Integer => Self::Integer(0),
			KvsType::Decimal => Self::Decimal(0.0),
			KvsType::Boolean => Self::Boolean(false),
			KvsType::String => Self::String(String::new()),
			KvsType::Vec1 => Self::Vec1([0.0; 1]),
			KvsType::Vec2 => Self::Vec2([0.0; 2]),
			KvsType::Vec3 => Self::Vec3([0.0; 3]),
			KvsType::Vec4 => Self::Vec4([0.0; 4]),
			KvsType::Array => Self::Array(Vec::new()),
			KvsType::Node => Self::Node(Vec::new()),
		}
	}
	fn kind(&self) -> KvsType {
		match self {
			Self::Null => KvsType::Null,
			Self::Integer(_) => KvsType::Integer,
			Self::Decimal(_) => KvsType::Decimal,
			Self::Boolean(_) => KvsType::Boolean,
			Self::String(_) => KvsType::String,
			Self::Vec1(_) => KvsType::Vec1,
			Self::Vec2(_) => KvsType::Vec2,
			Self::Vec3(_) => KvsType::Vec3,
			Self::Vec4(_) => KvsType::Vec4,
			Self::Array(_) => KvsType::Array,
			Self::Node(_) => KvsType::Node,
		}
	}
}

/// A document node
///
/// The parent exclusively owns its children. Changing the type always
/// releases whatever the previous value owned.
#[derive(Clone, Default, PartialEq)]
pub struct Kvs {
	name: String,
	name_hash: u32,
	value: Payload,
}

impl Kvs {
	/// Null, unnamed
	pub fn new() -> Self { Self::default() }
	/// Empty value of a type, unnamed
	pub fn with_type(kind: KvsType) -> Self {
		Self {
			value: Payload::new(kind),
			..Self::default()
		}
	}
	/// Parse a document from text, see [`text::read_text`]
	pub fn parse(text: &str) -> Result<Self, ParseError> {
		let mut kvs = Self::new();
		text::read_text(&mut kvs, text.as_bytes())?;
		Ok(kvs)
	}

	pub fn kind(&self) -> KvsType { self.value.kind() }
	pub(crate) fn payload(&self) -> &Payload { &self.value }
	/// Change the type, resetting the value
	///
	/// Does nothing if the type is unchanged.
	pub fn set_type(&mut self, kind: KvsType) {
		if self.kind() != kind {
			self.value = Payload::new(kind);
		}
	}
	/// Reset the value to its type's empty value
	pub fn clear(&mut self) { self.value = Payload::new(self.kind()); }
	/// Turn into null
	pub fn nullify(&mut self) { self.set_type(KvsType::Null); }

	pub fn is_null(&self) -> bool { self.kind() == KvsType::Null }
	pub fn is_integer(&self) -> bool { self.kind() == KvsType::Integer }
	pub fn is_decimal(&self) -> bool { self.kind() == KvsType::Decimal }
	pub fn is_boolean(&self) -> bool { self.kind() == KvsType::Boolean }
	pub fn is_string(&self) -> bool { self.kind() == KvsType::String }
	pub fn is_vector(&self) -> bool { self.kind().is_vector() }
	pub fn is_array(&self) -> bool { self.kind() == KvsType::Array }
	pub fn is_node(&self) -> bool { self.kind() == KvsType::Node }
	pub fn is_collection(&self) -> bool { self.kind().is_collection() }

	// accessors
	pub fn integer(&self) -> Option<i64> {
		match self.value {
			Payload::Integer(value) => Some(value),
			_ => None,
		}
	}
	pub fn decimal(&self) -> Option<f64> {
		match self.value {
			Payload::Decimal(value) => Some(value),
			_ => None,
		}
	}
	pub fn boolean(&self) -> Option<bool> {
		match self.value {
			Payload::Boolean(value) => Some(value),
			_ => None,
		}
	}
	pub fn string(&self) -> Option<&str> {
		match &self.value {
			Payload::String(value) => Some(value),
			_ => None,
		}
	}
	/// Components of any vector type
	pub fn vector(&self) -> Option<&[f32]> {
		match &self.value {
			Payload::Vec1(value) => Some(value),
			Payload::Vec2(value) => Some(value),
			Payload::Vec3(value) => Some(value),
			Payload::Vec4(value) => Some(value),
			_ => None,
		}
	}

	pub fn set_integer(&mut self, value: i64) { self.value = Payload::Integer(value); }
	pub fn set_decimal(&mut self, value: f64) { self.value = Payload::Decimal(value); }
	pub fn set_boolean(&mut self, value: bool) { self.value = Payload::Boolean(value); }
	pub fn set_string(&mut self, value: impl Into<String>) { self.value = Payload::String(value.into()); }
	pub fn set_vec1(&mut self, value: [f32; 1]) { self.value = Payload::Vec1(value); }
	pub fn set_vec2(&mut self, value: [f32; 2]) { self.value = Payload::Vec2(value); }
	pub fn set_vec3(&mut self, value: [f32; 3]) { self.value = Payload::Vec3(value); }
	pub fn set_vec4(&mut self, value: [f32; 4]) { self.value = Payload::Vec4(value); }
	/// Set a vector of 1 to 4 components
	///
	/// Returns `false` and leaves the node untouched for any other length.
	pub fn set_vector(&mut self, value: &[f32]) -> bool {
		self.value = match *value {
			[x] => Payload::Vec1([x]),
			[x, y] => Payload::Vec2([x, y]),
			[x, y, z] => Payload::Vec3([x, y, z]),
			[x, y, z, w] => Payload::Vec4([x, y, z, w]),
			_ => return false,
		};
		true
	}

	// names
	pub fn name(&self) -> &str { &self.name }
	pub fn name_hash(&self) -> u32 { self.name_hash }
	pub fn is_named(&self) -> bool { !self.name.is_empty() }
	pub fn set_name(&mut self, name: impl Into<String>) {
		self.name = name.into();
		self.name_hash = hash_name(&self.name);
	}
	pub fn clear_name(&mut self) {
		self.name.clear();
		self.name_hash = 0;
	}
	/// Builder form of [`Kvs::set_name`]
	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.set_name(name);
		self
	}

	// collections
	/// Children of a collection, empty for anything else
	pub fn children(&self) -> &[Kvs] {
		match &self.value {
			Payload::Array(children) | Payload::Node(children) => children,
			_ => &[],
		}
	}
	/// Children of a collection, empty for anything else
	pub fn children_mut(&mut self) -> &mut [Kvs] {
		match &mut self.value {
			Payload::Array(children) | Payload::Node(children) => children,
			_ => &mut [],
		}
	}
	fn collection(&self) -> Option<&Vec<Kvs>> {
		match &self.value {
			Payload::Array(children) | Payload::Node(children) => Some(children),
			_ => None,
		}
	}
	fn collection_mut(&mut self) -> &mut Vec<Kvs> {
		match &mut self.value {
			Payload::Array(children) | Payload::Node(children) => children,
			value => panic!("{:?} is not a collection", value.kind()),
		}
	}
	/// Number of children, 0 for anything but a collection
	pub fn len(&self) -> usize { self.children().len() }
	pub fn is_empty(&self) -> bool { self.children().is_empty() }
	pub fn capacity(&self) -> usize { self.collection().map_or(0, Vec::capacity) }
	/// Unused capacity
	pub fn space(&self) -> usize { self.capacity() - self.len() }
	pub fn iter(&self) -> std::slice::Iter<'_, Kvs> { self.children().iter() }
	pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Kvs> { self.children_mut().iter_mut() }

	/// Set the exact capacity, dropping children past it
	///
	/// # Panics
	/// If this is not a collection, as do all the collection mutators.
	pub fn set_capacity(&mut self, capacity: usize) {
		let children = self.collection_mut();
		children.truncate(capacity);
		if capacity > children.capacity() {
			children.reserve_exact(capacity - children.len());
		} else {
			children.shrink_to(capacity);
		}
	}
	/// Grow to twice the capacity plus 8, or `min_capacity` if larger
	pub fn grow(&mut self, min_capacity: usize) {
		let capacity = (self.capacity() * 2 + 8).max(min_capacity);
		self.set_capacity(capacity);
	}
	/// Make room for at least `additional` more children
	pub fn reserve(&mut self, additional: usize) {
		let needed = self.len() + additional;
		if needed > self.capacity() {
			self.grow(needed);
		}
	}
	/// Set the number of children, adding null ones or dropping from the back
	pub fn resize(&mut self, len: usize) {
		if len > self.capacity() {
			self.grow(len);
		}
		self.collection_mut().resize_with(len, Kvs::new);
	}
	pub fn shrink_to_fit(&mut self) { self.collection_mut().shrink_to_fit(); }
	/// Append a child, returning it
	pub fn push(&mut self, child: Kvs) -> &mut Kvs {
		if self.space() == 0 {
			self.grow(0);
		}
		let children = self.collection_mut();
		children.push(child);
		let last = children.len() - 1;
		&mut children[last]
	}
	pub fn pop(&mut self) -> Option<Kvs> { self.collection_mut().pop() }
	pub fn back(&self) -> Option<&Kvs> { self.children().last() }
	pub fn back_mut(&mut self) -> Option<&mut Kvs> { self.children_mut().last_mut() }
	/// Remove a child, keeping the order of the rest
	pub fn remove(&mut self, index: usize) -> Kvs { self.collection_mut().remove(index) }
	/// Remove a child by moving the last one into its place
	pub fn remove_over(&mut self, index: usize) -> Kvs { self.collection_mut().swap_remove(index) }

	/// Deep copy another node into this one, name included
	pub fn copy_from(&mut self, other: &Kvs) { self.clone_from(other); }
	/// Move out, leaving this node null and unnamed
	pub fn take(&mut self) -> Kvs { std::mem::take(self) }

	/// First child with a name
	pub fn find(&self, name: &str) -> Option<&Kvs> {
		let hash = hash_name(name);
		self.iter().find(|child| child.name_hash == hash && child.name_matches(name))
	}
	pub fn find_mut(&mut self, name: &str) -> Option<&mut Kvs> {
		let hash = hash_name(name);
		self.iter_mut().find(|child| child.name_hash == hash && child.name_matches(name))
	}
	/// First child with a name hash
	pub fn find_hash(&self, hash: u32) -> Option<&Kvs> { self.iter().find(|child| child.name_hash == hash) }
	pub fn find_hash_mut(&mut self, hash: u32) -> Option<&mut Kvs> {
		self.iter_mut().find(|child| child.name_hash == hash)
	}

	#[cfg(feature = "checked-names")]
	fn name_matches(&self, name: &str) -> bool {
		if self.name != name {
			log::warn!("name hash collision: {:?} and {:?} both hash to {:#010x}", self.name, name, self.name_hash);
			return false;
		}
		true
	}
	#[cfg(not(feature = "checked-names"))]
	fn name_matches(&self, _: &str) -> bool { true }
}

impl fmt::Debug for Kvs {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		if self.is_named() {
			write!(f, "{:?} = ", self.name)?;
		}
		match &self.value {
			Payload::Array(children) => {
				f.write_str("Array ")?;
				f.debug_list().entries(children).finish()
			}
			Payload::Node(children) => {
				f.write_str("Node ")?;
				f.debug_list().entries(children).finish()
			}
			value => fmt::Debug::fmt(value, f),
		}
	}
}
/// Canonical text, see [`text::write_text`]
impl fmt::Display for Kvs {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { text::write_text(self, f) }
}

impl Index<usize> for Kvs {
	type Output = Kvs;
	fn index(&self, index: usize) -> &Self::Output { &self.children()[index] }
}
impl IndexMut<usize> for Kvs {
	fn index_mut(&mut self, index: usize) -> &mut Self::Output { &mut self.children_mut()[index] }
}
/// Panics if no child has the name
impl Index<&str> for Kvs {
	type Output = Kvs;
	fn index(&self, name: &str) -> &Self::Output {
		match self.find(name) {
			Some(child) => child,
			None => panic!("no member named {name:?}"),
		}
	}
}

impl<'a> IntoIterator for &'a Kvs {
	type Item = &'a Kvs;
	type IntoIter = std::slice::Iter<'a, Kvs>;
	fn into_iter(self) -> Self::IntoIter { self.iter() }
}

macro_rules! impl_from {
	($t:ty, $setter:ident) => {
		impl From<$t> for Kvs {
			fn from(value: $t) -> Self {
				let mut kvs = Kvs::new();
				kvs.$setter(value);
				kvs
			}
		}
	};
}
impl_from!(i64, set_integer);
impl_from!(f64, set_decimal);
impl_from!(bool, set_boolean);
impl_from!(String, set_string);
impl_from!(&str, set_string);
impl_from!([f32; 1], set_vec1);
impl_from!([f32; 2], set_vec2);
impl_from!([f32; 3], set_vec3);
impl_from!([f32; 4], set_vec4);
