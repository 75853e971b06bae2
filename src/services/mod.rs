pub mod checksum;
pub mod classifier;

pub use classifier::classify;
