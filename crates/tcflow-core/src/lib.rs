//! tcflow core
//!
//! Declarative management of TeamCity build triggers, build features and SSH
//! keys. This crate holds everything that does not speak HTTP: the
//! reconciler contract and its four implementations, identity encoding, the
//! remote model, the manifest, and state management.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    tcflow CLI                    │
//! │            (plan / apply / destroy)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                  tcflow-core                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Engine ─▶ Reconciler (one per kind)    │   │
//! │  └──────────────────┬───────────────────────┘   │
//! │  ┌──────────────┐   │   ┌──────────────┐        │
//! │  │   Manifest   │   │   │  State Mgmt  │        │
//! │  └──────────────┘   │   └──────────────┘        │
//! └─────────────────────┼───────────────────────────┘
//!                       │ trait Remote
//!         ┌─────────────┴─────────────┐
//! ┌───────▼───────┐           ┌───────▼───────┐
//! │  REST gateway │           │ admin UI SSH  │
//! │               │           │ key workflow  │
//! └───────────────┘           └───────────────┘
//!           (both in tcflow-teamcity)
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod model;
pub mod remote;
pub mod resources;
pub mod state;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary};
pub use engine::{Engine, RefreshReport};
pub use error::{ReconcileError, Result};
pub use identity::{SSH_KEY_SEPARATOR, SshKeyId};
pub use manifest::Manifest;
pub use remote::{Gateway, ParentLookup, Remote, SshKeyWorkflow};
pub use resources::{Declared, Reconciler, ResourceKind};
pub use state::{GlobalState, ResourceState, StateLock, StateManager};
