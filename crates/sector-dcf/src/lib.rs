pub mod dcf;
pub mod sotp;


pub use dcf::*;
pub use sotp::*;
