//! # Fastbreak Core
//!
//! Core library for the fastbreak NBA statistics proxy.
//!
//! Fastbreak fronts a rate-limited, occasionally-unreliable upstream
//! statistics provider. All provider access goes through a single governed
//! path so the process never exceeds its outbound call budget, transient
//! failures are retried with exponential backoff, and successful lookups are
//! cached with per-resource TTLs.
//!
//! This crate provides the foundational components:
//!
//! - **[`cache`]**: Two-backend cache store (shared Redis, in-process
//!   fallback) with per-entry TTLs. Backend failures degrade to cache
//!   misses, never to caller-visible errors.
//!
//! - **[`upstream`]**: The outbound call governor, the retrying client that
//!   wraps every provider call, and the HTTP client for the provider's
//!   endpoints.
//!
//! - **[`service`]**: The data access façade — the only component the HTTP
//!   layer talks to. One operation per resource kind.
//!
//! - **[`analytics`]**: Pure derivation helpers (advanced stat columns,
//!   career milestones, archetype classification).
//!
//! - **[`middleware`]**: Inbound per-client rate limiting for the API
//!   surface.
//!
//! - **[`config`]**: Layered application configuration.
//!
//! ## Request Flow
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌──────────────┐
//! │ StatsService │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │ Cache Check  │ ─── Hit ──► Cached RecordSet
//! └──────┬───────┘
//!        │ Miss
//!        ▼
//! ┌────────────────┐      ┌──────────────┐
//! │ RetryingClient │ ───► │ CallGovernor │ (admit: blocks while the
//! └──────┬─────────┘      └──────────────┘  rolling window is full)
//!        │ per attempt, backoff 2^n
//!        ▼
//! ┌──────────────┐
//! │ StatsClient  │ ───► upstream provider
//! └──────┬───────┘
//!        │ success
//!        ▼
//! ┌──────────────┐
//! │ Cache Insert │ (per-kind TTL)
//! └──────┬───────┘
//!        │
//!        ▼
//!   RecordSet to caller
//! ```
//!
//! Exactly two failure kinds cross the façade boundary:
//! [`StatsError::NotFound`](upstream::StatsError::NotFound) (the provider
//! confirmed the resource does not exist) and
//! [`StatsError::Unavailable`](upstream::StatsError::Unavailable) (retries
//! exhausted). Cache outages are internal: they are logged and served as
//! misses.

pub mod analytics;
pub mod cache;
pub mod config;
pub mod middleware;
pub mod service;
pub mod types;
pub mod upstream;
