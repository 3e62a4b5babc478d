pub mod constants;
pub mod error;
pub mod policy;
pub mod range;
pub mod timestamp;

pub use constants::*;
pub use error::*;
pub use policy::*;
pub use range::*;
pub use timestamp::*;
