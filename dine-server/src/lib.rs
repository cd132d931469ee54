//! dine-server - restaurant operations core
//!
//! # Module structure
//!
//! ```text
//! dine-server/src/
//! ├── server/    # config, shared state, HTTP listener, shutdown
//! ├── api/       # HTTP routes and handlers
//! ├── orders/    # order aggregate: storage, reducer, commands, manager
//! ├── payments/  # gateway trait, providers, availability registry
//! ├── tables/    # table registry and session binding
//! └── message/   # realtime fan-out bus
//! ```
//!
//! All order mutations flow through [`OrdersManager`]: one command, one
//! write transaction, one version bump, one post-commit broadcast.

pub mod api;
pub mod message;
pub mod orders;
pub mod payments;
pub mod server;
pub mod tables;

pub use message::MessageBus;
pub use orders::{OrdersManager, ManagerError, ManagerResult};
pub use payments::{GatewayRegistry, PaymentGateway};
pub use server::{AppState, Server, ServerConfig};
pub use tables::SessionBinder;
