//! # Storage Layer
//!
//! Durable state lives in **slots**: named string values on an origin, the same
//! model as a browser's `localStorage`. The [`backend::StorageBackend`] trait is the
//! only thing the rest of the crate knows about storage.
//!
//! ## Contexts and Notifications
//!
//! A backend handle is one execution context. Several contexts may share an
//! origin (several tabs of the app). Writes go straight to the shared slots and
//! are announced through a [`feed::ChangeHub`] to every other context:
//!
//! ```text
//!   tab A ── write_slot("favorites") ──► slots
//!                     │
//!                     └──► hub ──► feed(tab B), feed(tab C)   (never tab A)
//! ```
//!
//! Receivers decide what to do with a notification; see
//! [`crate::cell::PersistedCell::sync`].
//!
//! ## Capacity
//!
//! Both backends accept an optional byte quota. A write that would exceed it fails
//! with [`crate::error::DexError::QuotaExceeded`] and leaves the slot untouched,
//! like a full `localStorage`.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one file per slot, atomic writes. Used by the CLI.
//! - [`mem_backend::MemBackend`]: for tests and embedding; `open_context()` makes
//!   a second tab.
//!
//! ## Storage Layout (FsBackend)
//!
//! ```text
//! <data dir>/
//! ├── dex.toml                         # Configuration
//! ├── pokemonApp_favorites.slot
//! ├── pokemonApp_globalPreferences.slot
//! └── pokemonApp_pagePreferences.slot
//! ```

pub mod backend;
pub mod feed;
pub mod fs_backend;
pub mod mem_backend;

pub use backend::StorageBackend;
pub use feed::{ChangeFeed, ChangeHub, ContextId, SlotChange};
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
