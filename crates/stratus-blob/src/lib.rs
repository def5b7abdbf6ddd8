//! Blob store backends.
//!
//! The production backend keeps blobs as flat files on local disk and hands
//! out presigned download URLs that route back through the HTTP server's
//! public download endpoint.

pub mod disk;
pub mod presign;

pub use disk::DiskBlobStore;
