//! Request-scoped data shapes exchanged between handlers, the object store
//! and the EXIF adapter. Nothing here outlives a single request except what
//! the store persists.

pub mod exif;
pub mod object;
pub mod upload;
