//! Traffic duplication and dispatch engine.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → coordinator.rs (method filter, sampling.rs gate)
//!     → forwarded.rs (extend X-Forwarded-For / Forwarded, optional)
//!     → duplicate.rs (drain body once, two independent copies)
//!     ├─ shadow copy  → target.rs → dispatcher.rs → discard (detached task)
//!     └─ primary copy → target.rs → dispatcher.rs → relay to caller
//! ```
//!
//! # Design Decisions
//! - Configuration is passed in explicitly; there is no global state
//! - Primary and shadow paths share nothing mutable except the sampler
//! - No cancellation crosses between the two paths

pub mod coordinator;
pub mod dispatcher;
pub mod duplicate;
pub mod forwarded;
pub mod request;
pub mod sampling;
pub mod target;

pub use coordinator::{Coordinator, Relay};
pub use dispatcher::{DispatchOutcome, RoleDispatcher};
pub use request::{OutboundRequest, Role};
pub use sampling::Sampler;
