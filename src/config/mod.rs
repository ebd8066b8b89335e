//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs overrides (command line flags win)
//!     → validation.rs (semantic checks)
//!     → ShadowConfig (validated, immutable)
//!     → shared via Arc to the dispatch engine
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{read_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, ObservabilityConfig, RoleConfig, SamplingConfig, ShadowConfig,
    TlsConfig,
};
pub use validation::{validate_config, ValidationError};
