// crates/core/src/lib.rs
//! Media fetching primitives shared by the reelgrab server.
pub mod error;
pub mod fetcher;
pub mod media;
pub mod paths;
pub mod progress;
pub mod ytdlp;

pub use error::*;
pub use fetcher::{MediaFetcher, ProgressCallback};
pub use media::*;
pub use paths::{ensure_writable_dir, validate_custom_path};
pub use ytdlp::YtDlpFetcher;
