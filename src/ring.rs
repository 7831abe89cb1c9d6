//! Frequency-domain history of past input blocks
//!
//! A fixed number of [`PackedSpectrum`] slots addressed by integer index. The
//! head slot receives the block currently being accumulated; after each
//! completed block the head retreats by one, so the block `n` steps in the
//! past always lives `n` slots above the head (modulo capacity).

use crate::spectrum::PackedSpectrum;

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Circular store of transformed input blocks.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    slots: Vec<PackedSpectrum>,
    head: usize,
}

impl HistoryRing {
    /// Create a ring of `capacity` zeroed slots for transforms of `fft_size`.
    ///
    /// `capacity` must be at least 1.
    pub fn new(capacity: usize, fft_size: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            slots: vec![PackedSpectrum::new(fft_size); capacity],
            head: 0,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot holding the current block.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Slot index holding the block `lag` blocks before the current one.
    pub fn slot_at_lag(&self, lag: usize) -> usize {
        (self.head + lag) % self.slots.len()
    }

    /// Block `lag` blocks before the current one.
    pub fn at_lag(&self, lag: usize) -> &PackedSpectrum {
        &self.slots[self.slot_at_lag(lag)]
    }

    /// The current block.
    pub fn current(&self) -> &PackedSpectrum {
        &self.slots[self.head]
    }

    /// Mutable access to the current block.
    pub fn current_mut(&mut self) -> &mut PackedSpectrum {
        &mut self.slots[self.head]
    }

    /// Move the head back one slot, wrapping from 0 to the top.
    ///
    /// The slot it lands on held the oldest block and is reused for the next.
    pub fn retreat(&mut self) {
        self.head = if self.head == 0 {
            self.slots.len() - 1
        } else {
            self.head - 1
        };
    }

    /// Zero every slot and return the head to 0.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.head = 0;
    }
}
