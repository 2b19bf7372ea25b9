//! The region allocator: one managed `Region`, two `ChunkList`
//! registries (allocated and free), and a scratch registry used only
//! during coalescing.
#[cfg(any(
    all(test, feature = "check_contracts_in_tests"),
    feature = "check_contracts"
))]
use contracts::*;
#[cfg(not(any(
    all(test, feature = "check_contracts_in_tests"),
    feature = "check_contracts"
)))]
use disabled_contracts::*;

use crate::chunk::WORD_SIZE;
use crate::chunk_list::ChunkList;
use crate::region::{Region, REGION_CAPACITY_WORDS};

/// Owns the managed region and the registries that partition it.
///
/// A fresh `Heap` starts with a single free chunk covering the whole
/// region; every `allocate`/`free` call preserves the partition
/// invariant (allocated ∪ free == region, no overlaps, no gaps) by
/// construction.
pub struct Heap {
    region: Region,
    allocated: ChunkList,
    free: ChunkList,
    scratch: ChunkList,
}

impl Default for Heap {
    fn default() -> Self {
        let region = Region::new();
        let mut free = ChunkList::new();
        free.insert(region.base(), REGION_CAPACITY_WORDS);

        Heap {
            region,
            allocated: ChunkList::new(),
            free,
            scratch: ChunkList::new(),
        }
    }
}

impl Heap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    pub fn allocated(&self) -> &ChunkList {
        &self.allocated
    }

    pub fn free_list(&self) -> &ChunkList {
        &self.free
    }

    /// Sum of sizes in the allocated registry plus sum of sizes in
    /// the free registry. At quiescence this must equal
    /// `REGION_CAPACITY_WORDS` (the partition coverage invariant).
    fn partition_covers_region(&self) -> bool {
        let allocated_words: usize = self.allocated.iter().map(|c| c.size).sum();
        let free_words: usize = self.free.iter().map(|c| c.size).sum();
        allocated_words + free_words == REGION_CAPACITY_WORDS
    }

    /// Rounds `size_bytes` up to a whole number of words, coalesces
    /// the free registry, then serves the request from the
    /// lowest-addressed free chunk that fits (first-fit).
    ///
    /// Returns `None` if `size_bytes` rounds to zero words, or if no
    /// free chunk is large enough — in both cases the registries are
    /// left unchanged relative to what coalescing alone would have
    /// done (the spec does not ask allocate to be a no-op on
    /// exhaustion, only that it return `None`).
    #[invariant(self.partition_covers_region(), "the registries still partition the region.")]
    #[ensures(old(size_bytes) == 0 -> ret.is_none(), "a zero-byte request always returns None.")]
    #[ensures(ret.is_some() -> self.allocated.find(ret.unwrap()).is_some(),
              "on success, the returned address is in the allocated registry.")]
    #[ensures(ret.is_some() -> self.free.find(ret.unwrap()).is_none(),
              "on success, the returned address is not also in the free registry.")]
    pub fn allocate(&mut self, size_bytes: usize) -> Option<usize> {
        let size_words = (size_bytes + WORD_SIZE - 1) / WORD_SIZE;

        if size_words == 0 {
            return None;
        }

        ChunkList::merge(&mut self.scratch, &self.free);
        std::mem::swap(&mut self.free, &mut self.scratch);

        let fit = self
            .free
            .iter()
            .enumerate()
            .find(|(_, chunk)| chunk.size >= size_words);

        let (index, chunk) = fit?;
        self.free.remove(index);
        self.allocated.insert(chunk.start, size_words);

        let tail_size_words = chunk.size - size_words;
        if tail_size_words > 0 {
            self.free.insert(chunk.start + size_words * WORD_SIZE, tail_size_words);
        }

        Some(chunk.start)
    }

    /// Releases the allocation at `ptr` back to the free registry.
    ///
    /// `ptr == None` is a silent no-op. Any other value must be an
    /// address previously returned by `allocate` and not yet freed;
    /// freeing an unknown address is a programming error and asserts.
    ///
    /// Unlike `allocate`, `free` does not coalesce: two back-to-back
    /// frees can leave adjacent free chunks un-merged until the next
    /// `allocate` cleans them up (see §4.2's edge-case policy).
    #[invariant(self.partition_covers_region(), "the registries still partition the region.")]
    #[ensures(old(ptr).is_some() -> self.allocated.find(old(ptr).unwrap()).is_none(),
              "after freeing a known address, it is gone from the allocated registry.")]
    pub fn free(&mut self, ptr: Option<usize>) {
        let ptr = match ptr {
            Some(ptr) => ptr,
            None => return,
        };

        let index = self
            .allocated
            .find(ptr)
            .expect("heap::free: address was not returned by allocate");
        let chunk = self.allocated.remove(index);
        self.free.insert(chunk.start, chunk.size);
    }

    /// Prints both registries via `ChunkList::dump`. Diagnostic only.
    pub fn dump(&self) {
        self.allocated.dump("Alloced");
        self.free.dump("Freed");
    }
}
