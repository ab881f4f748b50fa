//! Tollgate - Quota-Based Request Admission Service
//!
//! This crate implements a request-admission control layer that sits in
//! front of an arbitrary HTTP handler. Each logical client is granted a
//! quota of credits per fixed time window; requests within the quota are
//! forwarded untouched, requests beyond it are rejected. A signed token
//! presented by the caller can carry a per-caller quota override.

pub mod http;
pub mod limiter;
pub mod store;
pub mod config;
pub mod error;
