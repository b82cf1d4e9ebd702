pub mod analysis;
pub mod pipeline;
pub mod transport;
