//! Build context packing for busan.
//!
//! # Packing strategy
//!
//! ```text
//! pack(dir)
//!   1. Walk     ── every entry under dir, sorted by file name
//!   2. Name     ── ContextLayout::archive_name() (base name by default)
//!   3. Spool    ── tar records into an anonymous temp file, 1 KiB copy chunks
//!   4. Finish   ── archive trailer written once, file rewound
//! ```
//!
//! The returned [`PackedContext`] owns the spooled archive; the daemon
//! transport streams it as the build request body.
//!
//! # Layouts
//!
//! - **Flatten** (default): every file is stored under its base name.
//!   Two files with the same base name collide and the later one (in walk
//!   order) replaces the earlier one.
//! - **Relative**: files keep their path relative to the context root.

pub mod context;

pub use context::{CHUNK_SIZE, ContextLayout, PackError, PackedContext, pack};
