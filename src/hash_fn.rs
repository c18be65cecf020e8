use core::hash::Hash;

/// Multiplier of the xor-shift mixer used by [`hash_i32`].
const MIX_MULTIPLIER: u64 = 0x45d9f3b;

#[inline(always)]
fn mix(mut h: u64) -> u64 {
    h = ((h >> 16) ^ h).wrapping_mul(MIX_MULTIPLIER);
    h = ((h >> 16) ^ h).wrapping_mul(MIX_MULTIPLIER);
    (h >> 16) ^ h
}

/// Rounds half away from zero and keeps the low 32 bits.
#[inline(always)]
fn round_to_i32(scaled: f64) -> i32 {
    let whole = scaled as i64;
    let frac = scaled - whole as f64;
    let rounded = if frac >= 0.5 {
        whole.saturating_add(1)
    } else if frac <= -0.5 {
        whole.saturating_sub(1)
    } else {
        whole
    };
    rounded as i32
}

/// Hashes a signed 32-bit integer with a xor-shift-multiply mixer.
///
/// Negative values are sign-extended to 64 bits before mixing.
///
/// ```rust
/// # use chain_hash::hash_fn::hash_i32;
/// assert_ne!(hash_i32(&1), hash_i32(&2));
/// assert_eq!(hash_i32(&0), 0);
/// ```
pub fn hash_i32(key: &i32) -> u64 {
    mix(*key as i64 as u64)
}

/// Hashes a single precision float.
///
/// The value is quantized as `round((7x - 1) / 13)` and the resulting integer
/// is hashed with [`hash_i32`]. Nearby floats land on the same hash on
/// purpose: keys within roughly two units of each other share a bucket and are
/// told apart by the table's comparator.
///
/// ```rust
/// # use chain_hash::hash_fn::hash_f32;
/// assert_eq!(hash_f32(&0.1), hash_f32(&0.2));
/// ```
pub fn hash_f32(key: &f32) -> u64 {
    let scaled = (*key * 7.0 - 1.0) / 13.0;
    hash_i32(&round_to_i32(scaled as f64))
}

/// Hashes a double precision float with the same quantization as
/// [`hash_f32`].
pub fn hash_f64(key: &f64) -> u64 {
    let scaled = (*key * 7.0 - 1.0) / 13.0;
    hash_i32(&round_to_i32(scaled))
}

/// Hashes a string by the sum of its bytes.
///
/// Strings made of the same bytes in a different order collide, so tables
/// keyed this way lean on the comparator more than most.
///
/// ```rust
/// # use chain_hash::hash_fn::hash_str;
/// assert_eq!(hash_str("listen"), hash_str("silent"));
/// ```
pub fn hash_str<S: AsRef<str> + ?Sized>(key: &S) -> u64 {
    let sum = key
        .as_ref()
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_add(b as u64));
    hash_i32(&(sum as i32))
}

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        const DEFAULT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

        /// General-purpose hash for any `Hash` key, backed by foldhash with a
        /// fixed seed so that it can be used as a plain function pointer.
        pub fn default_hash<K: Hash + ?Sized>(key: &K) -> u64 {
            use core::hash::BuildHasher;

            foldhash::fast::FixedState::with_seed(DEFAULT_SEED).hash_one(key)
        }
    } else if #[cfg(feature = "std")] {
        /// General-purpose hash for any `Hash` key, backed by the standard
        /// library's unkeyed `DefaultHasher`.
        pub fn default_hash<K: Hash + ?Sized>(key: &K) -> u64 {
            use std::hash::BuildHasher;
            use std::hash::BuildHasherDefault;
            use std::hash::DefaultHasher;

            BuildHasherDefault::<DefaultHasher>::default().hash_one(key)
        }
    }
}
