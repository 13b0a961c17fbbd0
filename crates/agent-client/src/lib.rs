//! HTTP client for the host control agent and the wake service.
//!
//! The agent exposes `GET /status` plus one `POST` endpoint per power or
//! service action; the wake service exposes a single `POST /wake`.

pub mod client;

pub use client::{Client, ClientConfig, Error, RawResponse};
