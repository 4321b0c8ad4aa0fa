//! Version layer: registry access, range logic and the support search
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │◀────│    Probe    │◀────│  Resolver   │
//! │(versions,   │     │ (one manif. │     │  (bisect    │
//! │ manifests)  │     │  vs host)   │     │   versions) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │ Registries  │     │   Semver    │
//! │(npm,throttl)│     │ (npm ranges)│
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Registry trait for fetching versions and manifests
//! - [`registries`]: npm HTTP implementation and a concurrency limiter
//! - [`range`]: npm range dialect parser
//! - [`semver`]: satisfies / minimum / coerce over version strings
//! - [`probe`]: classifies one dependency version against the host
//! - [`resolver`]: searches for the minimum supported version
//! - [`types`]: `HostTarget`, `VersionSet`, `Manifest`
//! - [`error`]: Error types

pub mod error;
pub mod probe;
pub mod range;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod semver;
pub mod types;
