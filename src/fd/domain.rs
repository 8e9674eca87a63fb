//! Finite domains as packed bitsets (C3).
//!
//! A `Domain` is an immutable set of positive integers in `[1..=max_value]`.
//! Bit `i` of the underlying `FixedBitSet` represents the value `i + 1`, so
//! range operations (`remove_above`, `remove_below`, ...) are word-level mask
//! operations rather than per-value scans.
use fixedbitset::FixedBitSet;
use std::fmt;

#[derive(Clone)]
pub struct Domain {
    max_value: i64,
    bits: FixedBitSet,
}

fn value_to_index(max_value: i64, v: i64) -> Option<usize> {
    if v >= 1 && v <= max_value {
        Some((v - 1) as usize)
    } else {
        None
    }
}

impl Domain {
    /// The empty domain over `[1..=max_value]`.
    pub fn empty(max_value: i64) -> Domain {
        Domain {
            max_value,
            bits: FixedBitSet::with_capacity(max_value.max(0) as usize),
        }
    }

    /// The full domain `[1..=max_value]`.
    pub fn full(max_value: i64) -> Domain {
        let mut bits = FixedBitSet::with_capacity(max_value.max(0) as usize);
        bits.set_range(.., true);
        Domain { max_value, bits }
    }

    /// `[lo..=hi]` clamped to `[1..=max_value]`; empty if `lo > hi`.
    pub fn range(max_value: i64, lo: i64, hi: i64) -> Domain {
        let mut d = Domain::empty(max_value);
        let lo = lo.max(1);
        let hi = hi.min(max_value);
        if lo <= hi {
            d.bits
                .set_range((lo - 1) as usize..(hi as usize), true);
        }
        d
    }

    /// Deduplicated, out-of-range values are silently dropped.
    pub fn from_values(max_value: i64, values: &[i64]) -> Domain {
        let mut d = Domain::empty(max_value);
        for &v in values {
            if let Some(i) = value_to_index(max_value, v) {
                d.bits.insert(i);
            }
        }
        d
    }

    pub fn max_value(&self) -> i64 {
        self.max_value
    }

    pub fn has(&self, v: i64) -> bool {
        match value_to_index(self.max_value, v) {
            Some(i) => self.bits.contains(i),
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn min(&self) -> Option<i64> {
        self.bits.ones().next().map(|i| i as i64 + 1)
    }

    pub fn max(&self) -> Option<i64> {
        self.bits.ones().last().map(|i| i as i64 + 1)
    }

    pub fn is_singleton(&self) -> bool {
        self.count() == 1
    }

    /// Panics if the domain is not a singleton: a programmer error, per the
    /// distilled spec.
    pub fn singleton_value(&self) -> i64 {
        assert!(self.is_singleton(), "singleton_value() on non-singleton domain");
        self.min().unwrap()
    }

    pub fn to_slice(&self) -> Vec<i64> {
        self.iter_values().collect()
    }

    pub fn iter_values(&self) -> impl Iterator<Item = i64> + '_ {
        self.bits.ones().map(|i| i as i64 + 1)
    }

    /// Equal domains require matching `max_value` and bits.
    pub fn intersect(&self, other: &Domain) -> Domain {
        if self.max_value != other.max_value {
            return Domain::empty(self.max_value);
        }
        let mut bits = self.bits.clone();
        bits.intersect_with(&other.bits);
        Domain {
            max_value: self.max_value,
            bits,
        }
    }

    pub fn union(&self, other: &Domain) -> Domain {
        if self.max_value != other.max_value {
            return self.clone();
        }
        let mut bits = self.bits.clone();
        bits.union_with(&other.bits);
        Domain {
            max_value: self.max_value,
            bits,
        }
    }

    pub fn complement(&self) -> Domain {
        let mut bits = self.bits.clone();
        bits.toggle_range(..);
        Domain {
            max_value: self.max_value,
            bits,
        }
    }

    pub fn remove(&self, v: i64) -> Domain {
        let mut bits = self.bits.clone();
        if let Some(i) = value_to_index(self.max_value, v) {
            bits.set(i, false);
        }
        Domain {
            max_value: self.max_value,
            bits,
        }
    }

    /// Removes every value `> k`. Result equals `self ∩ [-inf..k]`.
    pub fn remove_above(&self, k: i64) -> Domain {
        let mut bits = self.bits.clone();
        let start = (k.max(0)) as usize;
        if start < bits.len() {
            bits.set_range(start.., false);
        }
        Domain {
            max_value: self.max_value,
            bits,
        }
    }

    /// Removes every value `>= k`.
    pub fn remove_at_or_above(&self, k: i64) -> Domain {
        self.remove_above(k - 1)
    }

    /// Removes every value `< k`.
    pub fn remove_below(&self, k: i64) -> Domain {
        let mut bits = self.bits.clone();
        let end = ((k - 1).max(0)) as usize;
        bits.set_range(..end.min(bits.len()), false);
        Domain {
            max_value: self.max_value,
            bits,
        }
    }

    /// Removes every value `<= k`.
    pub fn remove_at_or_below(&self, k: i64) -> Domain {
        self.remove_below(k + 1)
    }
}

impl PartialEq for Domain {
    fn eq(&self, other: &Domain) -> bool {
        self.max_value == other.max_value && self.bits == other.bits
    }
}
impl Eq for Domain {}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain{:?}", self.to_slice())
    }
}
