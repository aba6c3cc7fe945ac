//! Specialized data structures
//!
//! - **[`ring_buffer`]**: fixed-capacity buffer that overwrites its oldest
//!   element, used for the request metric history.

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;
