//! Number pool
//!
//! Hands out unique integer identities, chosen uniformly at random from
//! the numbers that are still free.

use std::collections::HashSet;

use rand::Rng;

use crate::error::{Error, Result};

/// Default upper bound of the pool (inclusive)
pub const DEFAULT_MAX_NUMBER: u32 = 100;

/// Pool of unallocated numbers `1..=max`
///
/// Free numbers live in a `Vec` so a uniform random pick is a single index
/// and removal is a `swap_remove`.
#[derive(Debug, Clone)]
pub struct NumberPool {
    max: u32,
    free: Vec<u32>,
    allocated: HashSet<u32>,
}

impl NumberPool {
    /// Create a pool holding `1..=max`, all free
    pub fn new(max: u32) -> Self {
        Self {
            max,
            free: (1..=max).collect(),
            allocated: HashSet::with_capacity(max as usize),
        }
    }

    /// Take a random free number
    pub fn allocate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<u32> {
        if self.free.is_empty() {
            return Err(Error::PoolExhausted);
        }

        let index = rng.gen_range(0..self.free.len());
        let number = self.free.swap_remove(index);
        self.allocated.insert(number);
        Ok(number)
    }

    /// Return a number to the pool
    ///
    /// Returns `false` (and changes nothing) if the number was not handed
    /// out by this pool.
    pub fn release(&mut self, number: u32) -> bool {
        if !self.allocated.remove(&number) {
            return false;
        }
        self.free.push(number);
        true
    }

    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty()
    }

    pub fn is_allocated(&self, number: u32) -> bool {
        self.allocated.contains(&number)
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub(crate) fn free_numbers(&self) -> &[u32] {
        &self.free
    }

    pub(crate) fn allocated_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.allocated.iter().copied()
    }
}

impl Default for NumberPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NUMBER)
    }
}
