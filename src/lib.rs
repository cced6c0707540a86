//! A dual-store message/event record keeper with a derived batch info
//! cache (GLOSSARY, §1-§2).
//!
//! The authoritative store ([`object_store`]) is a content-addressed KV
//! store with secondary indexes; the [`cache`] is a derived,
//! eventually-consistent rollup kept for cheap status/count reads. The
//! [`facade`] module exposes the three roles consumers actually drive:
//! batch lifecycle management, operational writes, and read-side
//! queries.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod facade;
pub mod ids;
pub mod index;
pub mod model;
pub mod object_store;
pub mod timestamp;
pub mod version;
