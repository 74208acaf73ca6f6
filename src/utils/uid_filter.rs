use autoscale_cuckoo_filter::CuckooFilter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Expected capacity and false-positive rate.
/// Tune these based on real badge counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Cuckoo filter over every registered UID.
///
/// A negative answer is only trusted once [`UidFilter::mark_ready`] has been
/// called after the warm-up; before that every UID "might exist".
pub struct UidFilter {
    filter: RwLock<CuckooFilter<String>>,
    ready: AtomicBool,
}

// UIDs compare exactly; only surrounding whitespace is dropped.
#[inline]
fn normalize(uid: &str) -> String {
    uid.trim().to_string()
}

impl UidFilter {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            ready: AtomicBool::new(false),
        }
    }

    /// Check if a UID might exist (false positives possible)
    pub fn might_exist(&self, uid: &str) -> bool {
        if !self.is_ready() {
            return true;
        }
        let uid = normalize(uid);
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&uid)
    }

    /// Insert a single UID into the filter
    pub fn insert(&self, uid: &str) {
        let uid = normalize(uid);
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&uid);
    }

    /// Insert a batch of UIDs under one lock
    pub fn insert_batch<'a>(&self, uids: impl IntoIterator<Item = &'a str>) {
        let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);
        for uid in uids {
            filter.add(&normalize(uid));
        }
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
