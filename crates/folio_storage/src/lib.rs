//! Durable blob storage for Folio assets.
//!
//! Generated cover images and interior illustrations are uploaded here and
//! addressed by durable URL from the relational store. The filesystem
//! backend stores blobs content-addressably so identical bytes deduplicate,
//! and writes atomically so concurrent cover jobs can never observe a
//! half-written file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;

pub use filesystem::FileSystemBlobStore;
