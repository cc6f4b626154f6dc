//! `swerex_runtime`: a sandboxed, remotely controllable shell-execution
//! runtime for autonomous software-engineering agents.
//!
//! See `SPEC_FULL.md` in the repository root for the full design. In
//! short: a PTY-backed [`session::BashSession`] state machine, a
//! [`registry::SessionRegistry`] of named sessions, a stateless
//! [`executor`] for one-shot commands, a [`facade::RuntimeFacade`] tying
//! both together, and an [`http`] control surface exposing the facade.

pub mod config;
pub mod error;
pub mod executor;
pub mod facade;
pub mod http;
pub mod output;
pub mod pty;
pub mod registry;
pub mod session;
pub mod syntax;
