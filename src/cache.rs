//! In-memory storage for generated subtitle text.
//!
//! A successful generation is kept around just long enough for the user to download
//! it and to initialize playback. Entries are keyed by freshly generated UUIDs and
//! aged out rather than explicitly deleted: downloads are allowed to repeat, so a
//! fetch does not consume the entry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

struct Entry {
    value: String,
    stored_at: Instant,
}

/// Take the entry map, recovering from lock poisoning.
///
/// A panic elsewhere while holding the lock cannot leave a plain `HashMap`
/// insert/lookup half-done, so the inner data is still usable and the cache API
/// stays infallible.
fn lock_entries(
    entries: &Mutex<HashMap<String, Entry>>,
) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
    entries
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A thread-safe, TTL-bounded map from opaque keys to raw subtitle text.
///
/// Construct one per process and share it (the server wraps it in the high-level
/// [`crate::Lyrify`] handle behind an `Arc`). All methods take `&self`; a single
/// mutex is plenty here since neither operation sits on a hot path.
pub struct SubtitleCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl SubtitleCache {
    /// Create a cache whose entries expire after `ttl` and which never holds more
    /// than `capacity` live entries at once.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Store `value` under a freshly generated key and return that key.
    ///
    /// Key uniqueness comes entirely from the random UUID generator; we do not
    /// check for collisions against existing keys.
    pub fn put(&self, value: String) -> String {
        let key = Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut entries = lock_entries(&self.entries);
        entries.retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);

        // Still full after the sweep: make room by dropping the oldest entry.
        while entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => entries.remove(&key),
                None => break,
            };
        }

        entries.insert(
            key.clone(),
            Entry {
                value,
                stored_at: now,
            },
        );
        key
    }

    /// Look up a previously issued key.
    ///
    /// A miss is an ordinary outcome (expired, never created, or simply wrong) and
    /// is reported as `None`, never as an error. Expired entries are removed here
    /// rather than lingering until the next `put`.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = lock_entries(&self.entries);
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Number of entries currently held, counting any not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        lock_entries(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
