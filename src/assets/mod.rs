//! Source acquisition: conditional HTTP fetch and image decoding.

pub mod decode;
pub mod fetch;
