//! Hash primitives: 32-bit digests for keys.
//!
//! All functions here are pure and depend only on the bit pattern of their
//! input (or, for pointers, the numeric address). Digests are stable across
//! runs and platforms of the same pointer width.

use core::hash::BuildHasher;

/// Thomas Wang's 32-bit integer mix.
#[inline]
pub const fn fast_hash32(x: u32) -> u32 {
    let mut x = (x ^ 61) ^ (x >> 16);
    x = x.wrapping_add(x << 3);
    x ^= x >> 4;
    x = x.wrapping_mul(0x27d4_eb2d);
    x ^ (x >> 15)
}

/// Combine two 32-bit words; building block for composite keys such as
/// 2-D coordinates.
#[inline]
pub const fn hash_pair(a: u32, b: u32, seed: u32) -> u32 {
    let h = fast_hash32(seed ^ a);
    fast_hash32(h ^ b)
}

#[inline]
pub const fn fast_hash64(x: u64) -> u32 {
    hash_pair(x as u32, (x >> 32) as u32, 0)
}

/// MurmurHash3, x86 32-bit variant, over an arbitrary byte range.
pub fn murmur3_x86_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    let mut h1 = seed;
    let mut blocks = data.chunks_exact(4);
    for block in &mut blocks {
        let mut k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);

        h1 ^= k1;
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    let mut k1: u32 = 0;
    if tail.len() >= 3 {
        k1 ^= u32::from(tail[2]) << 16;
    }
    if tail.len() >= 2 {
        k1 ^= u32::from(tail[1]) << 8;
    }
    if !tail.is_empty() {
        k1 ^= u32::from(tail[0]);
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= data.len() as u32;
    fmix32(h1)
}

#[inline]
const fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}

/// Types with a canonical 32-bit digest.
///
/// Owned and borrowed forms of the same data (`String`/`str`,
/// `Vec<u8>`/`[u8]`) produce the same digest so borrowed lookups agree with
/// stored keys.
pub trait HashKey {
    fn hash32(&self) -> u32;
}

macro_rules! hash_key_small_int {
    ($($t:ty),*) => {$(
        impl HashKey for $t {
            #[inline]
            fn hash32(&self) -> u32 {
                fast_hash32(*self as u32)
            }
        }
    )*};
}

macro_rules! hash_key_wide_int {
    ($($t:ty),*) => {$(
        impl HashKey for $t {
            #[inline]
            fn hash32(&self) -> u32 {
                fast_hash64(*self as u64)
            }
        }
    )*};
}

hash_key_small_int!(u8, u16, u32, i8, i16, i32);
hash_key_wide_int!(u64, i64, usize, isize);

impl HashKey for bool {
    #[inline]
    fn hash32(&self) -> u32 {
        fast_hash32(u32::from(*self))
    }
}

impl HashKey for char {
    #[inline]
    fn hash32(&self) -> u32 {
        fast_hash32(u32::from(*self))
    }
}

impl HashKey for u128 {
    fn hash32(&self) -> u32 {
        murmur3_x86_32(&self.to_le_bytes(), 0)
    }
}

impl HashKey for i128 {
    fn hash32(&self) -> u32 {
        murmur3_x86_32(&self.to_le_bytes(), 0)
    }
}

impl HashKey for f32 {
    #[inline]
    fn hash32(&self) -> u32 {
        fast_hash32(self.to_bits())
    }
}

impl HashKey for f64 {
    #[inline]
    fn hash32(&self) -> u32 {
        fast_hash64(self.to_bits())
    }
}

impl HashKey for str {
    fn hash32(&self) -> u32 {
        murmur3_x86_32(self.as_bytes(), 0)
    }
}

impl HashKey for String {
    fn hash32(&self) -> u32 {
        self.as_str().hash32()
    }
}

impl HashKey for [u8] {
    fn hash32(&self) -> u32 {
        murmur3_x86_32(self, 0)
    }
}

impl HashKey for Vec<u8> {
    fn hash32(&self) -> u32 {
        self.as_slice().hash32()
    }
}

impl<const N: usize> HashKey for [u8; N] {
    fn hash32(&self) -> u32 {
        murmur3_x86_32(self, 0)
    }
}

impl<T: ?Sized> HashKey for *const T {
    #[inline]
    fn hash32(&self) -> u32 {
        fast_hash64(self.cast::<()>() as usize as u64)
    }
}

impl<T: ?Sized> HashKey for *mut T {
    #[inline]
    fn hash32(&self) -> u32 {
        fast_hash64(self.cast::<()>() as usize as u64)
    }
}

impl<A: HashKey, B: HashKey> HashKey for (A, B) {
    #[inline]
    fn hash32(&self) -> u32 {
        hash_pair(self.0.hash32(), self.1.hash32(), 0)
    }
}

impl<T: HashKey + ?Sized> HashKey for &T {
    #[inline]
    fn hash32(&self) -> u32 {
        (**self).hash32()
    }
}

/// Key hashing functor used by the hash map.
pub trait KeyHasher<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u32;
}

/// Default hasher: the key's own [`HashKey`] digest.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FastHash;

impl<K: HashKey + ?Sized> KeyHasher<K> for FastHash {
    #[inline]
    fn hash_key(&self, key: &K) -> u32 {
        key.hash32()
    }
}

/// Adapter for any `core::hash::BuildHasher`; the 64-bit result is folded
/// to 32 bits.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdHash<S>(pub S);

impl<K, S> KeyHasher<K> for StdHash<S>
where
    K: core::hash::Hash + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u32 {
        let h = self.0.hash_one(key);
        (h ^ (h >> 32)) as u32
    }
}

/// Key equality functor used by the hash map.
pub trait KeyEq<K: ?Sized> {
    fn key_eq(&self, a: &K, b: &K) -> bool;
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EqualTo;

impl<K: PartialEq + ?Sized> KeyEq<K> for EqualTo {
    #[inline]
    fn key_eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}
