//! Flat-file backend for the story archive.
//!
//! Each collection lives in its own pretty-printed JSON array
//! (`works.json`, `chapters.json`, `comments.json`) inside one data directory.
//! A write reads the whole collection, mutates it in memory and replaces the
//! file through a temporary sibling and a rename, so readers only ever see a
//! complete file. Writers within one process are serialised by a shared lock.

mod files;
mod record;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::JsonStore;
