//! Airport data extraction.
//!
//! Finds the airport identifiers a pack declares in its `apt.dat`, along with
//! DSF-derived tier hints, and keeps both in a persistent cache keyed by a
//! content fingerprint so unchanged packs are not re-parsed.
//!
//! ```ignore
//! let cache = Arc::new(AirportCache::load(default_cache_path()));
//! let extractor = AirportExtractor::new(Arc::clone(&cache));
//! let extraction = extractor.extract(&descriptor);
//! cache.save()?;
//! ```

mod cache;
mod error;
mod extractor;
mod parser;

pub use cache::{
    default_cache_path, AirportCache, CacheEntry, CacheFile, CacheStats, Fingerprint,
    CACHE_FILE_NAME, CACHE_FORMAT_VERSION,
};
pub use error::ExtractionParseError;
pub use extractor::{AirportExtractor, Extraction};
pub use parser::{decode_text, AptDatParser, TextEncoding};
