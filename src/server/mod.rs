pub mod daemon;
pub mod framing;
pub mod protocol;
