//! Schema-driven REST resource tool DSL + dispatch runtime.
//!
//! This crate is the reusable core of Resourceful: it maps a named resource
//! and a CRUD verb onto a concrete HTTP request, applies the active API
//! profile's auth treatment, and normalizes the response into a uniform
//! outcome. The MCP server crate is a thin consumer; nothing in here knows
//! about transports or sessions beyond the profile value threaded into each
//! call.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod profile;
pub mod runtime;
pub mod schema;
pub mod semantics;
