//! wikidocs - versioned wiki documents served straight from object storage
//!
//! # Key Concepts
//!
//! - **Knowledge base**: a set of documentation snapshots under one id
//! - **Snapshot**: every document of a knowledge base at one commit sha,
//!   stored under `{base}/{kb}/docs/{sha}/`
//! - **Manifest**: `.umans/docs.json`, the pages that form the wiki and
//!   their order
//! - **Metadata sidecar**: where each document came from
//!
//! # Architecture
//!
//! ```text
//! cli ──▶ core::wiki::WikiStore ──▶ core::object_store::ObjectStore
//!                                     ├── LocalObjectStore (directory)
//!                                     └── RemoteObjectStore ──▶ remote::S3Client
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod remote;

pub use crate::config::Config;
pub use crate::core::keys::KeyLayout;
pub use crate::core::object_store::{Backend, ObjectStore};
pub use crate::core::wiki::WikiStore;
pub use crate::error::{StoreError, StoreResult};
pub use crate::remote::S3Client;
