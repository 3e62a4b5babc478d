pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod pipeline;

pub use config::*;
pub use device::*;
pub use error::*;
pub use metrics::*;
pub use pipeline::*;
