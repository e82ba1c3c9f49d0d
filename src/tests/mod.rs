// SPDX-License-Identifier: MIT OR Apache-2.0
//! engine, document and text format testing
mod atoms;
mod kvs;
