//! Lander networking: wire codec, transport and sync client

pub mod protocol;
pub mod sync;
pub mod transport;
