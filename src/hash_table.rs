use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use log::debug;
use log::trace;
use log::warn;

use crate::error::Result;
use crate::error::TableError;

/// Bucket-array size used by [`TableOptions::default`].
pub const DEFAULT_CAPACITY: usize = 16;

/// Load factor used by [`TableOptions::default`].
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Initial chain capacity of every bucket used by [`TableOptions::default`].
pub const DEFAULT_BUCKET_CAPACITY: usize = 5;

#[inline(always)]
fn resize_threshold(capacity: usize, load_factor: f32) -> usize {
    // Never zero, otherwise an empty table would already sit at its trigger.
    ((capacity as f64 * load_factor as f64) as usize).max(1)
}

/// Smallest `initial * 2^k` that can hold `needed` entries.
#[inline]
fn chain_capacity(initial: usize, needed: usize) -> Result<usize> {
    let mut capacity = initial;
    while capacity < needed {
        capacity = capacity
            .checked_mul(2)
            .ok_or(TableError::CapacityOverflow("bucket chain"))?;
    }
    Ok(capacity)
}

/// Which count is compared against the resize threshold.
///
/// The threshold itself is always `floor(capacity * load_factor)` (at least
/// one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthPolicy {
    /// Count buckets holding at least one entry.
    ///
    /// Heavily colliding keys pile into few buckets without ever reaching the
    /// threshold, so chains can grow well past the nominal capacity.
    #[default]
    OccupiedBuckets,
    /// Count stored entries, bounding the average chain length by the load
    /// factor.
    TotalEntries,
}

/// Construction parameters for a [`HashTable`].
///
/// # Examples
///
/// ```rust
/// # use chain_hash::GrowthPolicy;
/// # use chain_hash::TableOptions;
/// #
/// let options = TableOptions::new()
///     .with_capacity(64)
///     .with_load_factor(2.0)
///     .with_growth_policy(GrowthPolicy::TotalEntries);
/// assert!(options.validate().is_ok());
///
/// // An occupied-bucket trigger above 1.0 could never fire.
/// let options = options.with_growth_policy(GrowthPolicy::OccupiedBuckets);
/// assert!(options.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableOptions {
    /// Initial number of buckets.
    pub capacity: usize,
    /// Fraction of `capacity` that triggers a resize.
    pub load_factor: f32,
    /// Number of entries every fresh bucket has room for before its chain
    /// doubles.
    pub bucket_capacity: usize,
    /// What the load factor is measured against.
    pub growth: GrowthPolicy,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            growth: GrowthPolicy::default(),
        }
    }
}

impl TableOptions {
    /// Returns the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial number of buckets.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the load factor.
    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the initial chain capacity of each bucket.
    pub fn with_bucket_capacity(mut self, bucket_capacity: usize) -> Self {
        self.bucket_capacity = bucket_capacity;
        self
    }

    /// Sets the growth policy.
    pub fn with_growth_policy(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Checks that the options describe a table that can hold entries and
    /// grow.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(TableError::InvalidOptions("capacity must be at least 1"));
        }
        if self.bucket_capacity == 0 {
            return Err(TableError::InvalidOptions(
                "bucket capacity must be at least 1",
            ));
        }
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 {
            return Err(TableError::InvalidOptions(
                "load factor must be a positive finite number",
            ));
        }
        if self.growth == GrowthPolicy::OccupiedBuckets && self.load_factor > 1.0 {
            return Err(TableError::InvalidOptions(
                "load factor above 1.0 never triggers an occupied-bucket resize",
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// A chain of entries sharing one bucket index, in insertion order.
///
/// `capacity` is tracked separately from the `Vec` so that chain growth is a
/// strict doubling regardless of what the allocator hands back.
struct Bucket<K, V> {
    entries: Vec<Entry<K, V>>,
    capacity: usize,
}

impl<K: Clone, V: Clone> Clone for Bucket<K, V> {
    fn clone(&self) -> Self {
        let mut entries = Vec::with_capacity(self.capacity);
        entries.extend(self.entries.iter().cloned());
        Self {
            entries,
            capacity: self.capacity,
        }
    }
}

impl<K, V> Bucket<K, V> {
    fn with_capacity(capacity: usize) -> Result<Self> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(capacity)?;
        Ok(Self { entries, capacity })
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn find(&self, key: &K, compare: impl Fn(&K, &K) -> Ordering) -> Option<&Entry<K, V>> {
        self.entries
            .iter()
            .find(|entry| compare(&entry.key, key) == Ordering::Equal)
    }

    /// Makes room for one more entry, doubling the chain when it is full.
    fn reserve_one(&mut self) -> Result<()> {
        if self.entries.len() < self.capacity {
            return Ok(());
        }

        let grown = self
            .capacity
            .checked_mul(2)
            .ok_or(TableError::CapacityOverflow("bucket chain"))?;
        self.entries.try_reserve_exact(grown - self.entries.len())?;
        trace!("bucket chain grew from {} to {} entries", self.capacity, grown);
        self.capacity = grown;

        Ok(())
    }

    /// Appends an entry into space already reserved.
    #[inline]
    fn push(&mut self, entry: Entry<K, V>) {
        debug_assert!(self.entries.len() < self.capacity);
        self.entries.push(entry);
    }
}

fn allocate_buckets<K, V>(
    chain_capacities: impl ExactSizeIterator<Item = usize>,
) -> Result<Vec<Bucket<K, V>>> {
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(chain_capacities.len())?;
    for capacity in chain_capacities {
        buckets.push(Bucket::with_capacity(capacity)?);
    }
    Ok(buckets)
}

/// Statistics describing the shape of a [`HashTable`].
///
/// Available in tests or with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct TableStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of buckets
    pub capacity: usize,
    /// Number of buckets holding at least one entry
    pub occupied_buckets: usize,
    /// Value the growth policy's count must reach to trigger a resize
    pub resize_threshold: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Sum of all chain capacities
    pub chain_slots: usize,
    /// Entries per bucket (populated / capacity)
    pub load_factor: f64,
    /// Bucket utilization (occupied_buckets / capacity)
    pub bucket_utilization: f64,
    /// Average chain length over occupied buckets
    pub average_chain: f64,
}

#[cfg(any(test, feature = "stats"))]
impl TableStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Statistics ===");
        println!(
            "Population: {} entries in {} buckets ({:.2} per bucket)",
            self.populated, self.capacity, self.load_factor
        );
        println!(
            "Buckets: {}/{} occupied ({:.2}% utilization, resize at {})",
            self.occupied_buckets,
            self.capacity,
            self.bucket_utilization * 100.0,
            self.resize_threshold
        );
        println!(
            "Chains: longest {}, average {:.2}, {} slots reserved",
            self.longest_chain, self.average_chain, self.chain_slots
        );
    }
}

/// A hash table resolving collisions with per-bucket chains.
///
/// `HashTable<K, V, H, C>` owns its keys and values. It is configured once
/// with a hash function `H` mapping a key to a `u64` and a comparator `C`
/// ordering two keys, where `Ordering::Equal` means "same key". The bucket for
/// a key is `hash(key) % capacity`; keys are unique across the whole table.
///
/// When the count chosen by the [`GrowthPolicy`] reaches the resize threshold,
/// the bucket array doubles and every entry is rehashed before
/// [`put`](Self::put) returns.
///
/// ## Example
///
/// ```rust
/// # use chain_hash::HashTable;
/// # use chain_hash::TableError;
/// # use chain_hash::hash_fn::hash_i32;
/// #
/// let mut table = HashTable::new(2, hash_i32, i32::cmp)?;
/// table.put(1, 10)?;
/// table.put(2, 20)?;
/// table.put(3, 30)?;
///
/// assert_eq!(table.get(&2), Some(&20));
/// assert_eq!(table.put(2, 99), Err(TableError::DuplicateKey));
/// assert_eq!(table.get(&99), None);
/// # Ok::<(), TableError>(())
/// ```
#[derive(Clone)]
pub struct HashTable<K, V, H, C> {
    buckets: Vec<Bucket<K, V>>,

    populated: usize,
    occupied: usize,
    max_load: usize,

    load_factor: f32,
    bucket_capacity: usize,
    growth: GrowthPolicy,

    hash: H,
    compare: C,
}

/// A [`HashTable`] whose hash and comparator are plain function pointers, as
/// built by [`HashTable::with_default_hasher`].
pub type DefaultHashTable<K, V> = HashTable<K, V, fn(&K) -> u64, fn(&K, &K) -> Ordering>;

impl<K, V, H, C> Debug for HashTable<K, V, H, C>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("capacity", &self.buckets.len())
            .field("occupied_buckets", &self.occupied)
            .field("resize_threshold", &self.max_load)
            .field(
                "buckets",
                &self
                    .buckets
                    .iter()
                    .enumerate()
                    .filter(|(_, bucket)| !bucket.is_empty())
                    .map(|(index, bucket)| {
                        (
                            index,
                            bucket
                                .entries
                                .iter()
                                .map(|entry| (&entry.key, &entry.value))
                                .collect::<Vec<_>>(),
                        )
                    })
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<K, V, H, C> HashTable<K, V, H, C>
where
    H: Fn(&K) -> u64,
    C: Fn(&K, &K) -> Ordering,
{
    /// Creates a table with `capacity` buckets and default options otherwise.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidOptions`] if `capacity` is zero and
    /// [`TableError::ResourceExhausted`] if the buckets cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// # use chain_hash::hash_fn::hash_str;
    /// #
    /// let table = HashTable::<String, u32, _, _>::new(10, hash_str::<String>, String::cmp)?;
    /// assert_eq!(table.capacity(), 10);
    /// assert!(table.is_empty());
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn new(capacity: usize, hash: H, compare: C) -> Result<Self> {
        Self::with_options(TableOptions::new().with_capacity(capacity), hash, compare)
    }

    /// Creates a table from explicit [`TableOptions`].
    ///
    /// Every bucket is allocated up front with room for
    /// `options.bucket_capacity` entries.
    ///
    /// # Errors
    ///
    /// [`TableError::InvalidOptions`] if the options fail
    /// [`TableOptions::validate`] and [`TableError::ResourceExhausted`] if the
    /// buckets cannot be allocated.
    pub fn with_options(options: TableOptions, hash: H, compare: C) -> Result<Self> {
        options.validate()?;

        let buckets = allocate_buckets(
            core::iter::repeat_n(options.bucket_capacity, options.capacity),
        )?;

        Ok(Self {
            buckets,
            populated: 0,
            occupied: 0,
            max_load: resize_threshold(options.capacity, options.load_factor),
            load_factor: options.load_factor,
            bucket_capacity: options.bucket_capacity,
            growth: options.growth,
            hash,
            compare,
        })
    }

    #[inline(always)]
    fn bucket_index(&self, key: &K) -> usize {
        ((self.hash)(key) % self.buckets.len() as u64) as usize
    }

    /// Inserts `key` and `value`.
    ///
    /// If this insert brings the growth policy's count to the resize
    /// threshold, the bucket array doubles before the call returns.
    ///
    /// # Errors
    ///
    /// - [`TableError::DuplicateKey`] if a key comparing equal is already
    ///   stored.
    /// - [`TableError::ResourceExhausted`] or [`TableError::CapacityOverflow`]
    ///   if a chain or the bucket array cannot grow.
    ///
    /// On any error the table is exactly as it was before the call.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// # use chain_hash::TableError;
    /// #
    /// let mut table = HashTable::new(4, |&k: &u64| k, u64::cmp)?;
    /// table.put(0, "zero")?;
    /// table.put(1, "one")?;
    /// assert_eq!(table.capacity(), 4);
    ///
    /// // Third occupied bucket reaches floor(4 * 0.75).
    /// table.put(2, "two")?;
    /// assert_eq!(table.capacity(), 8);
    ///
    /// assert_eq!(table.put(1, "uno"), Err(TableError::DuplicateKey));
    /// assert_eq!(table.get(&1), Some(&"one"));
    /// # Ok::<(), TableError>(())
    /// ```
    pub fn put(&mut self, key: K, value: V) -> Result<()> {
        let index = self.bucket_index(&key);
        let bucket = &mut self.buckets[index];
        if bucket.find(&key, &self.compare).is_some() {
            return Err(TableError::DuplicateKey);
        }

        let previous_capacity = bucket.capacity;
        bucket.reserve_one()?;
        let was_empty = bucket.is_empty();
        bucket.push(Entry { key, value });

        if was_empty {
            self.occupied += 1;
        }
        self.populated += 1;

        if self.tracked_load() >= self.max_load {
            if let Err(err) = self.resize_rehash() {
                warn!(
                    "resize of {} buckets failed, rolling back insert: {}",
                    self.buckets.len(),
                    err
                );
                let bucket = &mut self.buckets[index];
                bucket.entries.pop();
                bucket.capacity = previous_capacity;
                if was_empty {
                    self.occupied -= 1;
                }
                self.populated -= 1;
                return Err(err);
            }
        }

        Ok(())
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// # use chain_hash::hash_fn::hash_f64;
    /// #
    /// let mut table = HashTable::new(8, hash_f64, f64::total_cmp)?;
    /// table.put(0.1, 'a')?;
    /// // Same quantized hash, different key.
    /// table.put(0.2, 'b')?;
    ///
    /// assert_eq!(table.get(&0.1), Some(&'a'));
    /// assert_eq!(table.get(&0.2), Some(&'b'));
    /// assert_eq!(table.get(&0.3), None);
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the stored key and value matching `key`.
    ///
    /// The stored key may differ from `key` in ways the comparator ignores.
    #[inline]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        if self.populated == 0 {
            return None;
        }

        self.buckets[self.bucket_index(key)]
            .find(key, &self.compare)
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Returns `true` if a key comparing equal to `key` is stored.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get_key_value(key).is_some()
    }

    /// Doubles the bucket array and redistributes every entry.
    ///
    /// All allocation happens before the first entry moves, so an error leaves
    /// the table untouched. Entries are placed directly into their new chains
    /// without going through [`put`](Self::put), which keeps the rehash from
    /// re-entering itself.
    #[cold]
    #[inline(never)]
    fn resize_rehash(&mut self) -> Result<()> {
        let old_capacity = self.buckets.len();
        let capacity = old_capacity
            .checked_mul(2)
            .ok_or(TableError::CapacityOverflow("bucket array"))?;

        // Destination of every entry, in bucket order then chain order.
        let mut plan: Vec<usize> = Vec::new();
        plan.try_reserve_exact(self.populated)?;
        let mut counts: Vec<usize> = Vec::new();
        counts.try_reserve_exact(capacity)?;
        counts.resize(capacity, 0);

        for entry in self.buckets.iter().flat_map(|bucket| bucket.entries.iter()) {
            let index = ((self.hash)(&entry.key) % capacity as u64) as usize;
            counts[index] += 1;
            plan.push(index);
        }

        for count in counts.iter_mut() {
            *count = chain_capacity(self.bucket_capacity, *count)?;
        }
        let buckets = allocate_buckets(counts.iter().copied())?;

        let old_buckets = core::mem::replace(&mut self.buckets, buckets);
        let mut occupied = 0;
        for (entry, index) in old_buckets
            .into_iter()
            .flat_map(|bucket| bucket.entries)
            .zip(plan)
        {
            let bucket = &mut self.buckets[index];
            if bucket.is_empty() {
                occupied += 1;
            }
            bucket.push(entry);
        }

        self.occupied = occupied;
        self.max_load = resize_threshold(capacity, self.load_factor);

        debug!(
            "resized from {} to {} buckets: {} entries in {} occupied buckets, next resize at {}",
            old_capacity, capacity, self.populated, self.occupied, self.max_load
        );

        Ok(())
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V> HashTable<K, V, fn(&K) -> u64, fn(&K, &K) -> Ordering>
where
    K: core::hash::Hash + Ord,
{
    /// Creates a table hashing keys with
    /// [`default_hash`](crate::hash_fn::default_hash) and comparing them with
    /// their `Ord` implementation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::DefaultHashTable;
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table: DefaultHashTable<String, u32> = HashTable::with_default_hasher(16)?;
    /// table.put("apple".to_string(), 3)?;
    /// assert_eq!(table.get(&"apple".to_string()), Some(&3));
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn with_default_hasher(capacity: usize) -> Result<Self> {
        Self::new(
            capacity,
            crate::hash_fn::default_hash::<K> as fn(&K) -> u64,
            <K as Ord>::cmp as fn(&K, &K) -> Ordering,
        )
    }
}

impl<K, V, H, C> HashTable<K, V, H, C> {
    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of buckets.
    ///
    /// Only ever doubles over the table's lifetime.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the number of buckets holding at least one entry.
    pub fn occupied_buckets(&self) -> usize {
        self.occupied
    }

    /// Returns the configured load factor.
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns the count at which the next resize happens.
    pub fn resize_threshold(&self) -> usize {
        self.max_load
    }

    /// Returns the configured growth policy.
    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth
    }

    #[inline(always)]
    fn tracked_load(&self) -> usize {
        match self.growth {
            GrowthPolicy::OccupiedBuckets => self.occupied,
            GrowthPolicy::TotalEntries => self.populated,
        }
    }

    /// Returns how many buckets hold chains of each length.
    ///
    /// Index `n` of the result counts buckets with exactly `n` entries; the
    /// last index is the longest chain.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let longest = self
            .buckets
            .iter()
            .map(|bucket| bucket.entries.len())
            .max()
            .unwrap_or(0);

        let mut hist = alloc::vec![0usize; longest + 1];
        for bucket in &self.buckets {
            hist[bucket.entries.len()] += 1;
        }
        hist
    }

    /// Returns statistics describing the table's current shape.
    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> TableStats {
        let capacity = self.buckets.len();
        let longest_chain = self
            .buckets
            .iter()
            .map(|bucket| bucket.entries.len())
            .max()
            .unwrap_or(0);

        TableStats {
            populated: self.populated,
            capacity,
            occupied_buckets: self.occupied,
            resize_threshold: self.max_load,
            longest_chain,
            chain_slots: self.buckets.iter().map(|bucket| bucket.capacity).sum(),
            load_factor: self.populated as f64 / capacity as f64,
            bucket_utilization: self.occupied as f64 / capacity as f64,
            average_chain: if self.occupied == 0 {
                0.0
            } else {
                self.populated as f64 / self.occupied as f64
            },
        }
    }

    /// Pretty-prints the chain-length histogram as horizontal bars.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        let hist = self.chain_histogram();
        let max = hist.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("Chain histogram: (empty)");
            return;
        }

        const WIDTH: usize = 50;
        println!("Chain histogram (chain length: buckets)");
        for (len, &count) in hist.iter().enumerate() {
            let bar = (count * WIDTH).div_ceil(max);
            println!("{len:>4}: {:<WIDTH$} {count}", "#".repeat(bar));
        }
    }

    /// `(used, capacity)` of every bucket chain.
    #[cfg(test)]
    fn chain_shapes(&self) -> Vec<(usize, usize)> {
        self.buckets
            .iter()
            .map(|bucket| (bucket.entries.len(), bucket.capacity))
            .collect()
    }
}
