//! Deserializers for ROOT object payloads.
//!
//! Each submodule handles one streamed class family. The payload handed
//! in is the decompressed TKey object data, positioned at the start of
//! the object's own streamer.

mod ttree;

pub use ttree::read_ttree;
