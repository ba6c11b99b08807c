//! Capture region and write-pointer tracking.
//!
//! Every chirp the capture DMA moves one block from the ADC buffer into the
//! capture region at the current write pointer. The pointer only moves forward:
//! the region is a linear, write-once span per run and capture quietly stops
//! issuing transfers once the next block would no longer fit.
//!
//! ```text
//! base                         current            end
//!  │████ block 0 ████ block 1 ██│░░░░░░░░░░░░░░░░░░│
//!  └── advanced by block_size on every DMA completion
//! ```
//!
//! ## Synchronization
//!
//! Three contexts touch the tracker:
//!
//! | Context | Writes |
//! |---------|--------|
//! | Chirp-available ISR | `chirp_pending` (set), `chirps` |
//! | DMA-completion ISR | `current`, `in_flight` (clear), `completions` |
//! | Polling loop | `chirp_pending` (clear), `in_flight` (set) |
//!
//! Each field has one writer per transition, so plain atomics suffice and no
//! ISR path ever waits.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::driver::DmaAddress;

/// Memory region the capture DMA writes into.
pub struct CaptureRegion {
    memory: &'static mut [u8],
    dma_address: DmaAddress,
}

impl CaptureRegion {
    /// Wrap a DMA-reachable region.
    ///
    /// `dma_address` is the address of `memory[0]` as seen by the DMA engine.
    pub fn new(memory: &'static mut [u8], dma_address: DmaAddress) -> Self {
        CaptureRegion {
            memory,
            dma_address,
        }
    }

    pub fn dma_address(&self) -> DmaAddress {
        self.dma_address
    }

    pub fn capacity(&self) -> u32 {
        self.memory.len() as u32
    }

    /// Overwrite the region with `pattern`.
    pub fn fill(&mut self, pattern: u8) {
        self.memory.fill(pattern);
    }

    /// The CPU view of the captured data.
    pub fn as_slice(&self) -> &[u8] {
        self.memory
    }
}

/// Write-pointer and transfer-state tracker for one capture run.
#[derive(Debug)]
pub struct CaptureTracker {
    base: DmaAddress,
    end: DmaAddress,
    block_size: u32,
    current: AtomicU32,
    in_flight: AtomicBool,
    chirp_pending: AtomicBool,
    chirps: AtomicU32,
    completions: AtomicU32,
}

impl CaptureTracker {
    /// Create an empty tracker. Nothing can be captured until [`arm`](Self::arm).
    pub const fn new() -> Self {
        CaptureTracker {
            base: 0,
            end: 0,
            block_size: 0,
            current: AtomicU32::new(0),
            in_flight: AtomicBool::new(false),
            chirp_pending: AtomicBool::new(false),
            chirps: AtomicU32::new(0),
            completions: AtomicU32::new(0),
        }
    }

    /// Reset for a new run over `[base, base + capacity)`.
    pub fn arm(&mut self, base: DmaAddress, capacity: u32, block_size: u32) {
        self.base = base;
        self.end = base.saturating_add(capacity);
        self.block_size = block_size;
        *self.current.get_mut() = base;
        *self.in_flight.get_mut() = false;
        *self.chirp_pending.get_mut() = false;
        *self.chirps.get_mut() = 0;
        *self.completions.get_mut() = 0;
    }

    /// Chirp-available ISR: count the chirp and flag it for the polling loop.
    #[inline]
    pub fn notify_chirp(&self) {
        self.chirps.fetch_add(1, Ordering::Relaxed);
        self.chirp_pending.store(true, Ordering::Release);
    }

    /// Consume a pending chirp flag. Returns `false` if none was pending.
    #[inline]
    pub fn take_chirp(&self) -> bool {
        self.chirp_pending.swap(false, Ordering::AcqRel)
    }

    /// Check that the previous transfer has completed before re-arming.
    ///
    /// # Panics
    /// Panics if a transfer is still in flight: chirps are arriving faster
    /// than the DMA can drain them.
    #[inline]
    pub fn assert_idle(&self) {
        assert!(
            !self.in_flight.load(Ordering::Acquire),
            "chirp re-armed while the previous DMA transfer is still in flight"
        );
    }

    /// Destination of the next block, or `None` once the region is full.
    ///
    /// A block is only placed while `current + block_size < end`, so the last
    /// block-sized span of the region is never written.
    #[inline]
    pub fn next_destination(&self) -> Option<DmaAddress> {
        let current = self.current.load(Ordering::Acquire);
        current
            .checked_add(self.block_size)
            .filter(|&next| next < self.end)
            .map(|_| current)
    }

    /// Record that a transfer has been started.
    #[inline]
    pub fn mark_in_flight(&self) {
        self.in_flight.store(true, Ordering::Release);
    }

    /// DMA-completion ISR: advance the write pointer and clear the in-flight flag.
    #[inline]
    pub fn complete(&self) {
        self.completions.fetch_add(1, Ordering::Relaxed);
        let prev = self.current.fetch_add(self.block_size, Ordering::AcqRel);
        debug_assert!(prev + self.block_size <= self.end, "write pointer ran past the region");
        self.in_flight.store(false, Ordering::Release);
    }

    pub fn base(&self) -> DmaAddress {
        self.base
    }

    pub fn end(&self) -> DmaAddress {
        self.end
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn current(&self) -> DmaAddress {
        self.current.load(Ordering::Acquire)
    }

    /// Bytes written so far in this run.
    pub fn bytes_captured(&self) -> u32 {
        self.current() - self.base
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_chirp_pending(&self) -> bool {
        self.chirp_pending.load(Ordering::Acquire)
    }

    /// Chirp-available interrupts seen in this run.
    pub fn chirps(&self) -> u32 {
        self.chirps.load(Ordering::Relaxed)
    }

    /// DMA completions seen in this run.
    pub fn completions(&self) -> u32 {
        self.completions.load(Ordering::Relaxed)
    }
}

impl Default for CaptureTracker {
    fn default() -> Self {
        Self::new()
    }
}
