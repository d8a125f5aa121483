//! Core module - document store model and resolvers

pub mod cache;
pub mod documents;
pub mod keys;
pub mod link;
pub mod manifest;
pub mod metadata;
pub mod object_store;
pub mod search;
pub mod title;
pub mod toc;
pub mod tree;
pub mod versions;
pub mod wiki;
