#![forbid(unsafe_code)]

//! Real-time voice translation pipeline: microphone audio is chunked,
//! transcribed and translated through a remote service, with an
//! offline-resilient caching proxy in front of every network call.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use app::{App, PipelineController};
pub use domain::{AppConfig, DomainError, Language, PipelineEvent, SessionState};
