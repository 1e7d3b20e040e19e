//! # Biblot
//!
//! Scripture passage lookup with personal notes.
//!
//! Biblot turns a human-readable reference such as `Juan 3:16` into clean
//! passage text by fetching the public passage page, extracting the passage
//! container and stripping the page furniture around it. Users can attach
//! notes to verses; each note stores a snapshot of the verse text in
//! PostgreSQL, behind a connection manager that retries, probes and
//! reconnects.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────┐
//! │  Fetcher   │──▶│ Extractor  │──▶│  Cleaner   │──▶ passage text
//! │ (reqwest)  │   │ (html DOM) │   │ (rules)    │        │
//! └────────────┘   └────────────┘   └────────────┘        │
//!                                                         ▼
//!                  ┌────────────────────┐   ┌────────────────────┐
//!                  │ ConnectionManager  │◀──│     NoteStore      │
//!                  │ retry/probe/reopen │   │ users + notes      │
//!                  └─────────┬──────────┘   └────────────────────┘
//!                            ▼
//!                       PostgreSQL
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! biblot init                                   # create tables
//! biblot verse "Juan 3:16"                      # print a verse
//! biblot chapter "Salmos 23" --translation NVI  # print a chapter
//! biblot note add 42 "Juan 3:16" "Gracia"       # save a note
//! biblot note list 42                           # newest first
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment fallback |
//! | [`error`] | Resolution and storage error types |
//! | [`reference`] | `Book chapter[:verse]` parsing |
//! | [`fetch`] | HTTP retrieval of passage pages |
//! | [`extract`] | Passage container extraction |
//! | [`clean`] | Text cleanup rule chain |
//! | [`resolver`] | Fetch, extract and clean in one call |
//! | [`db`] | Connection manager with retry and liveness |
//! | [`migrate`] | Schema creation |
//! | [`models`] | Stored record types |
//! | [`notes`] | User and note persistence |
//! | [`stats`] | Database summary |

pub mod clean;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod migrate;
pub mod models;
pub mod notes;
pub mod reference;
pub mod resolver;
pub mod stats;
