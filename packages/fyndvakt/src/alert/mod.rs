//! Alert gateway implementations.

pub mod elks;

pub use elks::ElksGateway;
