pub mod error;
pub mod scoring;
pub mod sector;
pub mod stats;
pub mod traits;
pub mod types;
pub mod valuation;

pub use error::*;
pub use scoring::*;
pub use sector::*;
pub use traits::*;
pub use types::*;
pub use valuation::*;
