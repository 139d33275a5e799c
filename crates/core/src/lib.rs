//! Core types and capabilities for finlit
//!
//! This crate provides foundational types used across all other crates:
//! - Chat exchange types shared by the chat widget and its backend
//! - Auth collaborator contract (session, user, state changes)
//! - Client-local key-value storage
//! - The explicit application context that owns all local mutable state
//! - Cancellation signals for outbound work
//! - Error types

pub mod auth;
pub mod cancel;
pub mod context;
pub mod conversation;
pub mod error;
pub mod storage;

pub use auth::{
    wait_for_session, AuthError, AuthProvider, AuthState, InMemoryAuthProvider, Session, User,
};
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use context::{AppContext, Navigator, Theme};
pub use conversation::{ChatExchange, ChatRole};
pub use error::{Error, Result};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
