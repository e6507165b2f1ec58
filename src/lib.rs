//! switchboard - One request shape for many LLM backends
//!
//! This is the convenience wrapper crate that re-exports the switchboard
//! core library.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! switchboard = "0.1"
//! ```
//!
//! ```no_run
//! use switchboard::prelude::*;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let server = Server::new(Config::load_or_default())?;
//! server.start().await?;
//! # Ok(())
//! # }
//! ```

// Re-export core
pub use switchboard_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use switchboard_core::{
        Config, GenerationParams, Message, Provider, ProviderRegistry, RouteRequest, Router,
        Server,
    };
}
