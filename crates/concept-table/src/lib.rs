//! Chained hash table keyed by byte content.
//!
//! Keys are hashed with FNV-1a over their raw bytes, so a borrowed `&[u8]`
//! view and an owned [`ByteBuf`] with the same content always land in the
//! same bucket. Buckets start at the next prime at or above a configured
//! default and double (capped) once the load factor reaches 0.8; growth only
//! ever happens on the mutating access path, so shared read-only lookups are
//! safe by construction.
//!
//! Prime bucket sizing is a tuning choice, not a correctness requirement: a
//! non-prime bucket count makes hash values that share factors with it
//! cluster into the same buckets when the hash output is not uniform.

use concept_store::ByteBuf;

/// Default bucket-count request; rounded up to the next prime (1031).
pub const DEFAULT_BUCKET_REQUEST: usize = 1024;

/// Bucket-count growth cap.
pub const MAX_BUCKET_COUNT: usize = 1_000_000_007;

/// Load factor at or above which the next mutating access grows the table.
pub const LOAD_FACTOR_LIMIT: f64 = 0.8;

const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325; // 14695981039346656037
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3; // 1099511628211
const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5; // 2166136261
const FNV32_PRIME: u32 = 0x0100_0193; // 16777619

/// FNV-1a over raw bytes, at the platform's word width.
///
/// Identical byte content yields identical hashes regardless of how the
/// bytes are owned.
#[inline]
pub fn fnv1a(bytes: &[u8]) -> usize {
    if size_of::<usize>() == 8 {
        let mut hash = FNV64_OFFSET_BASIS;
        for &byte in bytes {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV64_PRIME);
        }
        hash as usize
    } else {
        let mut hash = FNV32_OFFSET_BASIS;
        for &byte in bytes {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(FNV32_PRIME);
        }
        hash as usize
    }
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    if n % 3 == 0 {
        return n == 3;
    }
    let mut factor = 5;
    while factor * factor <= n {
        if n % factor == 0 || n % (factor + 2) == 0 {
            return false;
        }
        factor += 6;
    }
    true
}

/// Smallest prime at or above `n`.
pub fn next_prime_from(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// Closed-address chained map from byte-content keys to `V`.
///
/// Lookup with [`get`](ChainedTable::get) is strictly read-only and reports
/// absence as `None`. [`entry_mut`](ChainedTable::entry_mut) is the
/// insert-or-fetch path; it checks the load factor and rehashes *before*
/// touching any bucket, so a new entry always lands in the post-growth
/// layout.
pub struct ChainedTable<V> {
    buckets: Vec<Vec<(ByteBuf, V)>>,
    entries: usize,
}

impl<V> ChainedTable<V> {
    pub fn new() -> Self {
        Self::with_bucket_request(DEFAULT_BUCKET_REQUEST)
    }

    /// Start with the next prime at or above `request` buckets.
    pub fn with_bucket_request(request: usize) -> Self {
        let count = next_prime_from(request);
        Self {
            buckets: (0..count).map(|_| Vec::new()).collect(),
            entries: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.entries as f64 / self.buckets.len() as f64
    }

    /// Read-only lookup. Never grows or rehashes.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let bucket = &self.buckets[fnv1a(key) % self.buckets.len()];
        bucket
            .iter()
            .find(|(entry_key, _)| entry_key.as_slice() == key)
            .map(|(_, value)| value)
    }

    /// Fetch the value at `key`, inserting a default one if missing.
    ///
    /// Growth is checked first: at or above [`LOAD_FACTOR_LIMIT`] the bucket
    /// count doubles (capped at [`MAX_BUCKET_COUNT`]) and every entry is
    /// rehashed before this access is performed.
    pub fn entry_mut(&mut self, key: &[u8]) -> &mut V
    where
        V: Default,
    {
        if self.load_factor() >= LOAD_FACTOR_LIMIT {
            let doubled = self.buckets.len().saturating_mul(2).min(MAX_BUCKET_COUNT);
            self.rehash(doubled);
        }

        let index = fnv1a(key) % self.buckets.len();
        let bucket = &mut self.buckets[index];
        match bucket.iter().position(|(entry_key, _)| entry_key.as_slice() == key) {
            Some(pos) => &mut bucket[pos].1,
            None => {
                bucket.push((ByteBuf::from_slice(key), V::default()));
                self.entries += 1;
                let last = bucket.len() - 1;
                &mut bucket[last].1
            }
        }
    }

    /// Insert or overwrite the value at `key`.
    pub fn insert(&mut self, key: &[u8], value: V)
    where
        V: Default,
    {
        *self.entry_mut(key) = value;
    }

    /// Redistribute every entry over `new_bucket_count` buckets. The bucket
    /// count can only grow; smaller requests are ignored. Entries are moved,
    /// never recreated, so none can be dropped along the way.
    pub fn rehash(&mut self, new_bucket_count: usize) {
        if new_bucket_count <= self.buckets.len() {
            return;
        }
        let old_buckets = std::mem::replace(
            &mut self.buckets,
            (0..new_bucket_count).map(|_| Vec::new()).collect(),
        );
        for bucket in old_buckets {
            for (key, value) in bucket {
                let index = fnv1a(&key) % new_bucket_count;
                self.buckets[index].push((key, value));
            }
        }
    }

    /// Iterate over all entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&ByteBuf, &V)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(key, value)| (key, value)))
    }
}

impl<V> Default for ChainedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}
