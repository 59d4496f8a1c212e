//! Zero-copy concatenation of [`netbuf_core::Buffer`] components that
//! presents itself as a single addressable byte range.

pub mod composite;

pub use composite::CompositeBuffer;
