pub mod financial;
pub mod peer;

pub use financial::*;
pub use peer::*;
