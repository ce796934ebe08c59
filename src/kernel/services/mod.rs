//! Services layer (ports + adapters).
//!
//! - `ports`: pure contracts/types used across the app (kernel-facing).
//! - `adapters`: OS specific implementations (IO/async).

pub mod adapters;
pub mod bus;
pub mod ports;

pub use bus::{index_bus, IndexBusReceiver, IndexBusSender};
