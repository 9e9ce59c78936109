//! Stevedore Core - Core types for the bundle installer
//!
//! This crate provides the foundational types used throughout Stevedore:
//! - `Installation`: The custom resource naming a bundle and carrying install status
//! - `Declaration`: One object from a bundle, with a cheap header and lazy payload
//! - `DocumentSplitter`: Multi-document stream decoding
//! - `classify`: Routing of declarations to an apply strategy
//! - `InstallerConfig`: Process-wide configuration

pub mod classifier;
pub mod config;
pub mod declaration;
pub mod error;
pub mod installation;
pub mod splitter;

pub use classifier::{ApplyStrategy, SCHEMA_GROUP, SCHEMA_RESOURCE, SCHEMA_VERSION, classify};
pub use config::{InstallerConfig, OverlayConfig};
pub use declaration::{Declaration, DeclarationHeader, Document, split_api_version};
pub use error::{CoreError, Result};
pub use installation::{
    BundleKind, Installation, InstallationSpec, InstallationStatus, TOTAL_NEVER_ATTEMPTED,
};
pub use splitter::{DocumentSplitter, split_documents};
