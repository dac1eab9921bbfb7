//! # Core Application Logic
//!
//! This module contains the harness business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • Pages + dispatch     │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │  Session   │      │   Client   │
//!     │  Adapter   │      │ (one handle│      │  (trait +  │
//!     │ (ratatui)  │      │  at a time)│      │  loopback) │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum, everything that can happen in the app
//! - [`session`]: Client session with the centralized connected guard
//! - [`pages`]: Chat room, playground and tester form handlers
//! - [`dispatch`]: Invocation subscribers

pub mod action;
pub mod actions;
pub mod chat;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod forms;
pub mod pages;
pub mod session;
pub mod state;
