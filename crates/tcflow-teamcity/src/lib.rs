//! TeamCity client for tcflow
//!
//! Implements the [`tcflow_core::Remote`] seams against a live server.
//!
//! # Features
//!
//! - Build configuration and project lookups over REST
//! - Trigger and build feature create/read/delete over REST
//! - SSH key upload and removal through the admin UI forms
//!
//! # Example
//!
//! ```ignore
//! use tcflow_core::{Engine, Manifest};
//! use tcflow_teamcity::{Auth, TeamCityClient};
//!
//! let client = TeamCityClient::new("https://ci.example.com", Auth::Token(token))?;
//! let engine = Engine::new(&client);
//!
//! let plan = engine.plan(&manifest, &mut state).await?;
//! ```

pub mod client;
pub mod error;
pub mod ssh_keys;
pub mod wire;

pub use client::{Auth, TeamCityClient};
pub use error::{Result, TeamCityError};
