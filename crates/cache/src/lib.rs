//! URL-keyed cache for scraped listings.
//!
//! Entries live for a fixed TTL, are never refreshed in place, and at most
//! one fetch per key is in flight at any time.

pub mod clock;
pub mod key;
pub mod locks;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{canonical_url, canonicalize};
pub use locks::KeyLocks;
pub use store::{spawn_purger, CacheEntry, RetrievalCache};
