// Copyright 2026 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::nal::unit::NalUnit;

/// Default number of NAL units kept for reuse.
pub const NAL_FREE_LIST_SIZE: usize = 16;

/// A bounded pool of cleared `NalUnit`s, bucketed by the power of two below their capacity.
///
/// Allocation prefers the smallest unit that already fits, so large buffers are not spent on
/// small parameter-set units.
pub struct NalUnitPool {
    buckets: BTreeMap<u32, Vec<NalUnit>>,
    retained: usize,
    max_retained: usize,
}

/// Every unit in bucket `k` has a capacity of at least `2^k`.
fn bucket_of_capacity(capacity: usize) -> u32 {
    if capacity == 0 {
        0
    } else {
        usize::BITS - 1 - capacity.leading_zeros()
    }
}

/// Smallest bucket whose units are guaranteed to hold `size` bytes.
fn bucket_for_size(size: usize) -> u32 {
    if size <= 1 {
        0
    } else {
        usize::BITS - (size - 1).leading_zeros()
    }
}

impl NalUnitPool {
    pub fn new(max_retained: usize) -> Self {
        NalUnitPool {
            buckets: BTreeMap::new(),
            retained: 0,
            max_retained,
        }
    }

    /// Number of units currently held for reuse.
    pub fn len(&self) -> usize {
        self.retained
    }

    pub fn is_empty(&self) -> bool {
        self.retained == 0
    }

    /// Returns a cleared unit with room for at least `size` bytes.
    pub fn alloc(&mut self, size: usize) -> Result<NalUnit> {
        let mut unit = self.take(size).unwrap_or_default();
        unit.clear();

        if let Err(e) = unit.resize(size) {
            self.free(unit);
            return Err(e);
        }
        Ok(unit)
    }

    /// Keeps `unit` for reuse, or drops it if the pool is full.
    pub fn free(&mut self, mut unit: NalUnit) {
        if self.retained >= self.max_retained {
            return;
        }

        unit.clear();
        self.buckets
            .entry(bucket_of_capacity(unit.capacity()))
            .or_default()
            .push(unit);
        self.retained += 1;
    }

    fn take(&mut self, size: usize) -> Option<NalUnit> {
        let wanted = bucket_for_size(size);

        // Best fit first, otherwise the largest unit we have; it only needs to grow a little.
        let key = self
            .buckets
            .range(wanted..)
            .find(|(_, units)| !units.is_empty())
            .or_else(|| {
                self.buckets
                    .iter()
                    .rev()
                    .find(|(_, units)| !units.is_empty())
            })
            .map(|(key, _)| *key)?;

        let units = self.buckets.get_mut(&key)?;
        let unit = units.pop();
        if units.is_empty() {
            self.buckets.remove(&key);
        }
        if unit.is_some() {
            self.retained -= 1;
        }
        unit
    }
}

impl Default for NalUnitPool {
    fn default() -> Self {
        NalUnitPool::new(NAL_FREE_LIST_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_math() {
        assert_eq!(bucket_of_capacity(1), 0);
        assert_eq!(bucket_of_capacity(8), 3);
        assert_eq!(bucket_of_capacity(15), 3);
        assert_eq!(bucket_for_size(8), 3);
        assert_eq!(bucket_for_size(9), 4);
        for size in 1..300 {
            assert!(1usize << bucket_for_size(size) >= size);
        }
    }

    #[test]
    fn freed_units_are_reused() {
        let mut pool = NalUnitPool::default();
        let mut unit = pool.alloc(100).unwrap();
        unit.append(&[1, 2, 3]).unwrap();
        unit.pts = 9;
        pool.free(unit);
        assert_eq!(pool.len(), 1);

        let unit = pool.alloc(50).unwrap();
        assert!(pool.is_empty());
        assert_eq!(unit.size(), 0);
        assert_eq!(unit.pts, 0);
        assert!(unit.capacity() >= 100);
    }

    #[test]
    fn prefers_smallest_fitting_unit() {
        let mut pool = NalUnitPool::default();
        let small = pool.alloc(16).unwrap();
        let large = pool.alloc(4096).unwrap();
        pool.free(large);
        pool.free(small);

        let unit = pool.alloc(10).unwrap();
        assert!(unit.capacity() < 4096);

        // Nothing small is left, so the large unit is handed out.
        let unit = pool.alloc(10).unwrap();
        assert!(unit.capacity() >= 4096);
    }

    #[test]
    fn free_list_is_bounded() {
        let mut pool = NalUnitPool::new(2);
        for _ in 0..5 {
            pool.free(NalUnit::new());
        }
        assert_eq!(pool.len(), 2);
    }
}
