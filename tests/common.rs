#![allow(dead_code)]

use std::hash::BuildHasher;
use std::hash::Hasher;

use probe_hash::HashMap;
use probe_hash::HashSet;
use probe_hash::LinearProbing;
use probe_hash::QuadraticProbing;
use rand::TryRngCore;
use rand::rngs::OsRng;
use siphasher::sip::SipHasher;

/// SipHash with keys drawn from the OS once per builder.
#[derive(Clone)]
pub struct SipHashBuilder {
    k1: u64,
    k2: u64,
}

impl BuildHasher for SipHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new_with_keys(self.k1, self.k2)
    }
}

impl Default for SipHashBuilder {
    fn default() -> Self {
        let mut rng = OsRng;
        Self {
            k1: rng.try_next_u64().unwrap_or(0),
            k2: rng.try_next_u64().unwrap_or(0),
        }
    }
}

/// Hashes integers to themselves so the bucket of a key is the key masked
/// by the bucket count.
#[derive(Clone, Default)]
pub struct IdentityHashBuilder;

pub struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | b as u64;
        }
    }

    fn write_u32(&mut self, n: u32) {
        self.0 = n as u64;
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
}

impl BuildHasher for IdentityHashBuilder {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher(0)
    }
}

pub type LinearMap<K, V> = HashMap<K, V, SipHashBuilder, LinearProbing>;
pub type QuadraticMap<K, V> = HashMap<K, V, SipHashBuilder, QuadraticProbing>;
pub type LinearSet<T> = HashSet<T, SipHashBuilder, LinearProbing>;
pub type QuadraticSet<T> = HashSet<T, SipHashBuilder, QuadraticProbing>;

// Run a map test once per collision policy.
macro_rules! with_maps {
    (|$map:ident| $body:block) => {{
        {
            let $map = || common::LinearMap::with_policies(0, common::SipHashBuilder::default());
            $body
        }
        {
            let $map =
                || common::QuadraticMap::with_policies(0, common::SipHashBuilder::default());
            $body
        }
    }};
}

// Run a set test once per collision policy.
macro_rules! with_sets {
    (|$set:ident| $body:block) => {{
        {
            let $set = || common::LinearSet::with_policies(0, common::SipHashBuilder::default());
            $body
        }
        {
            let $set = || common::QuadraticSet::with_policies(0, common::SipHashBuilder::default());
            $body
        }
    }};
}

pub(crate) use with_maps;
pub(crate) use with_sets;
