pub mod batch;
pub mod browser;
pub mod config;
pub mod extract;
pub mod images;
pub mod normalize;
pub mod olx;
pub mod persist;
pub mod traits;

pub use batch::BatchImporter;
pub use config::ImporterConfig;
pub use olx::OlxScraper;
pub use persist::HttpFetcher;
pub use traits::{BlobStore, ImageFetcher, ListingScraper, RecordStore};
