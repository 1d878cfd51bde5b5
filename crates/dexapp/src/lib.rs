//! # dexapp
//!
//! Client-side state for a Pokédex browser: what the user keeps between sessions
//! (favorites, preferences) and what they share by link (filters, sort, page).
//! The catalog itself, and everything drawn on screen, are someone else's job.
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - One DexApi per backend context ("tab")                   │
//! │  - Dispatches to command modules, returns CmdResult         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*)                                 │
//! │  - favorites, preferences, query                            │
//! │  - No stdout/stderr, no exit codes                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Stores (favorites.rs, preferences.rs)  │ query.rs          │
//! │  - built from PersistedCell (cell.rs)   │ - URL <-> state   │
//! │  - values checked by codec.rs           │ - no storage      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/*)                                          │
//! │  - StorageBackend: string slots + change feed               │
//! │  - FsBackend (files), MemBackend (memory)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `transforms.rs` holds the pure list operations the views apply to catalog
//! data (search, generation filter, sort).
//!
//! ## Failure Model
//!
//! Reads never fail: bad stored data falls back to defaults and bad URL params to
//! their field defaults. Writes are best-effort and keep the in-memory value when
//! storage refuses them. Both are reported through `tracing`. Only explicit
//! operations such as an import or a malformed CLI value return an error.

pub mod api;
pub mod cell;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod favorites;
pub mod init;
pub mod model;
pub mod preferences;
pub mod query;
pub mod store;
pub mod transforms;
