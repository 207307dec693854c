pub mod client;
pub mod store;

pub use client::create_s3_client;
pub use store::S3Store;
