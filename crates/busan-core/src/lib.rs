//! Core types and configuration for busan.
//!
//! This crate defines the build descriptor contract ([`BuildDescriptor`]),
//! the optional `attributes.yml` schema ([`RuntimeConfig`]), the service
//! identity shared by images and containers ([`ServiceName`]), and the
//! version patterns used on both sides of the version gate.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod service;
pub mod version;

pub use config::{ATTRIBUTES_FILE_NAME, RuntimeConfig};
pub use descriptor::{BuildDescriptor, DESCRIPTOR_FILE_NAME};
pub use error::{Error, Result};
pub use service::ServiceName;
