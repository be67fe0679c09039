//! Shared plumbing for every service module: configuration, SDK setup,
//! response field mapping, and fixed-interval waiters.

pub mod aws;
pub mod config;
pub mod sdk;
pub mod waiter;
