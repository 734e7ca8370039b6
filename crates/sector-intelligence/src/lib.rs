pub mod classifier;
pub mod profiles;
pub mod reference;
pub mod registry;

#[cfg(test)]
mod classifier_tests;

pub use classifier::*;
pub use registry::*;
