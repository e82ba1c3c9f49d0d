// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read KVS text files and print them back as canonical text
//!
//! `cargo run --example echo -- file.kvs...`

use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
	let mut status = ExitCode::SUCCESS;
	for path in std::env::args_os().skip(1) {
		let path = Path::new(&path);
		match kvlite::read_text_file(path) {
			Ok(kvs) => {
				println!("// {}", path.display());
				print!("{kvs}");
			}
			Err(error) => {
				eprintln!("{}: {error}", path.display());
				status = ExitCode::FAILURE;
			}
		}
	}
	status
}
