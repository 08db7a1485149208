//! Thin I/O shell around the decision core: backend HTTP client, credential
//! acquisition, proxy plumbing, and the per-account cycle runner.

pub mod auth;
pub mod client;
pub mod proxy;
pub mod runner;
