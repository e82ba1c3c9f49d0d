// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::kvs::{Kvs, KvsType, hash_name};

fn integers(values: impl IntoIterator<Item = i64>) -> Kvs {
	let mut kvs = Kvs::with_type(KvsType::Array);
	for value in values {
		kvs.push(Kvs::from(value));
	}
	kvs
}

fn contents(kvs: &Kvs) -> Vec<i64> { kvs.iter().filter_map(Kvs::integer).collect() }

#[test]
fn name_hash() {
	assert_eq!(hash_name(""), 0);
	assert_eq!(hash_name("a"), 0xe40c_292c);
	assert_eq!(hash_name("foobar"), 0xbf9c_f968);

	let mut kvs = Kvs::new().named("a");
	assert!(kvs.is_named());
	assert_eq!(kvs.name_hash(), hash_name("a"));
	kvs.set_name("foobar");
	assert_eq!(kvs.name_hash(), 0xbf9c_f968);
	kvs.clear_name();
	assert_eq!((kvs.name(), kvs.name_hash()), ("", 0));
}

#[test]
fn set_type() {
	let mut kvs = Kvs::from("text");
	kvs.set_type(KvsType::String);
	assert_eq!(kvs.string(), Some("text"));
	kvs.set_type(KvsType::Integer);
	assert_eq!((kvs.kind(), kvs.integer(), kvs.string()), (KvsType::Integer, Some(0), None));
	kvs.set_type(KvsType::Vec3);
	assert_eq!(kvs.vector(), Some(&[0.0; 3][..]));
	kvs.nullify();
	assert!(kvs.is_null());

	let mut node = integers([1, 2]).named("n");
	node.set_type(KvsType::Node);
	assert!(node.is_node() && node.is_empty());
	assert_eq!(node.name(), "n");
}

#[test]
fn typed_access() {
	let mut kvs = Kvs::from(1.5);
	assert!(kvs.is_decimal());
	assert_eq!((kvs.decimal(), kvs.integer()), (Some(1.5), None));
	kvs.set_boolean(true);
	assert_eq!(kvs.boolean(), Some(true));
	kvs.set_vec2([1.0, 2.0]);
	assert!(kvs.is_vector() && !kvs.is_collection());
	assert_eq!(kvs.kind(), KvsType::Vec2);
	assert!(!kvs.set_vector(&[]));
	assert!(!kvs.set_vector(&[0.0; 5]));
	assert_eq!(kvs.vector(), Some(&[1.0, 2.0][..]));
	assert!(kvs.set_vector(&[1.0, 2.0, 3.0, 4.0]));
	assert_eq!(kvs.kind(), KvsType::Vec4);
	assert_eq!(Kvs::from([5.0f32]).vector(), Some(&[5.0][..]));
}

#[test]
fn clear_keeps_type() {
	let mut kvs = integers([1, 2, 3]);
	kvs.clear();
	assert!(kvs.is_array() && kvs.is_empty());
	let mut kvs = Kvs::from(7i64);
	kvs.clear();
	assert_eq!(kvs.integer(), Some(0));
}

#[test]
fn growth() {
	let mut kvs = Kvs::with_type(KvsType::Array);
	assert_eq!(kvs.capacity(), 0);
	kvs.push(Kvs::from(1i64));
	assert_eq!((kvs.len(), kvs.capacity(), kvs.space()), (1, 8, 7));
	for value in 2..=9i64 {
		kvs.push(Kvs::from(value));
	}
	assert_eq!((kvs.len(), kvs.capacity()), (9, 24));

	kvs.set_capacity(3);
	assert_eq!((kvs.len(), kvs.capacity()), (3, 3));
	assert_eq!(contents(&kvs), [1, 2, 3]);

	kvs.reserve(30);
	assert_eq!(kvs.capacity(), 33);
	kvs.shrink_to_fit();
	assert_eq!(kvs.capacity(), 3);
}

#[test]
fn resize() {
	let mut kvs = Kvs::with_type(KvsType::Node);
	kvs.resize(1);
	assert_eq!((kvs.len(), kvs.capacity()), (1, 8));
	assert!(kvs[0].is_null());
	kvs[0].set_integer(4);
	kvs.resize(3);
	assert_eq!(kvs.len(), 3);
	assert_eq!(kvs[0].integer(), Some(4));
	kvs.resize(0);
	assert_eq!((kvs.len(), kvs.capacity()), (0, 8));
}

#[test]
fn push_and_pop() {
	let mut kvs = Kvs::with_type(KvsType::Array);
	kvs.push(Kvs::new()).set_string("pushed");
	assert_eq!(kvs.back().and_then(Kvs::string), Some("pushed"));
	if let Some(back) = kvs.back_mut() {
		back.set_integer(1);
	}
	assert_eq!(kvs.pop().and_then(|kvs| kvs.integer()), Some(1));
	assert_eq!(kvs.pop(), None);
	assert_eq!(kvs.back(), None);
}

#[test]
fn remove() {
	let mut kvs = integers(0..5);
	assert_eq!(kvs.remove(1).integer(), Some(1));
	assert_eq!(contents(&kvs), [0, 2, 3, 4]);
	assert_eq!(kvs.remove_over(0).integer(), Some(0));
	assert_eq!(contents(&kvs), [4, 2, 3]);
}

#[test]
fn copy_is_deep() {
	let mut source = Kvs::with_type(KvsType::Node).named("root");
	source.push(integers([1, 2]).named("list"));
	let mut copy = Kvs::from(3i64);
	copy.copy_from(&source);
	assert_eq!(copy, source);
	if let Some(list) = copy.find_mut("list") {
		list.push(Kvs::from(3i64));
	}
	assert_eq!(contents(&source["list"]), [1, 2]);
	assert_eq!(contents(&copy["list"]), [1, 2, 3]);
}

#[test]
fn take_leaves_null() {
	let mut source = integers([1]).named("x");
	let moved = source.take();
	assert!(source.is_null() && !source.is_named());
	assert_eq!(moved.name(), "x");
	assert_eq!(contents(&moved), [1]);
}

#[test]
fn find() {
	let mut kvs = Kvs::with_type(KvsType::Node);
	kvs.push(Kvs::from(1i64).named("a"));
	kvs.push(Kvs::from(2i64).named("b"));
	kvs.push(Kvs::from(3i64).named("b"));
	assert_eq!(kvs.find("b").and_then(Kvs::integer), Some(2));
	assert_eq!(kvs.find("c"), None);
	assert_eq!(kvs.find_hash(hash_name("a")).and_then(Kvs::integer), Some(1));
	if let Some(b) = kvs.find_hash_mut(hash_name("b")) {
		b.set_integer(20);
	}
	assert_eq!(kvs["b"].integer(), Some(20));
	assert_eq!(Kvs::from(1i64).find("a"), None);
}

#[test]
#[cfg(feature = "checked-names")]
fn find_skips_hash_collisions() {
	assert_eq!(hash_name("costarring"), hash_name("liquid"));
	let mut kvs = Kvs::with_type(KvsType::Node);
	kvs.push(Kvs::from(1i64).named("costarring"));
	assert_eq!(kvs.find("liquid"), None);
	assert_eq!(kvs.find("costarring").and_then(Kvs::integer), Some(1));
	assert_eq!(kvs.find_hash(hash_name("liquid")).map(Kvs::name), Some("costarring"));
}

#[test]
#[should_panic(expected = "no member named")]
fn index_missing_name() { let _ = &Kvs::with_type(KvsType::Node)["missing"]; }

#[test]
#[should_panic(expected = "is not a collection")]
fn push_to_scalar() { Kvs::from(true).push(Kvs::new()); }

#[test]
fn iterate() {
	let kvs = integers([1, 2, 3]);
	let mut sum = 0;
	for child in &kvs {
		sum += child.integer().unwrap_or_default();
	}
	assert_eq!(sum, 6);
	assert_eq!(Kvs::from("scalar").iter().count(), 0);
	assert_eq!(Kvs::from("scalar").space(), 0);
}

#[test]
fn debug_format() {
	assert_eq!(format!("{:?}", Kvs::from(1i64).named("a")), "\"a\" = Integer(1)");
	assert_eq!(format!("{:?}", integers([2])), "Array [Integer(2)]");
}

#[test]
fn display_root_forms() {
	assert_eq!(Kvs::from(5i64).to_string(), "5\n");
	assert_eq!(integers([1, 2]).to_string(), "1\n2\n");
	let mut node = Kvs::with_type(KvsType::Node);
	node.push(Kvs::from("v").named("k"));
	assert_eq!(node.to_string(), "k = \"v\"\n");
}
