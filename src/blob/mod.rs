pub mod error;
#[cfg(test)]
pub mod fake;
pub mod s3;
pub mod storage;

pub use error::BlobStoreError;
#[cfg(test)]
pub use fake::FakeBlobStore;
pub use s3::S3BlobStore;
pub use storage::BlobStore;
