pub mod capture;
#[cfg(feature = "microphone")]
pub mod microphone;
pub mod replay;
