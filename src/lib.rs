pub mod config;
pub mod error;
pub mod names;
pub mod s3;
pub mod store;
pub mod transfer;
pub mod utils;

pub use error::{LookupError, TransferError};
pub use names::{Lookups, build_lookups, normalize_name};
pub use store::{MemoryStore, RemoteStore};
pub use transfer::{UploadSettings, download, plan_directory, upload, upload_directory};
