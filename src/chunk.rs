//! A `Chunk` is a half-open interval `[start, start + size * WORD_SIZE)`
//! over the managed region, where `start` is a byte address and `size`
//! is a word count.  Chunks carry no payload of their own; they are
//! pure bookkeeping for `ChunkList`.
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

/// The size, in bytes, of a machine word.  The allocator only ever
/// deals in whole words: `size_bytes` requests are rounded up to this
/// granularity before anything else happens.
pub const WORD_SIZE: usize = std::mem::size_of::<usize>();

/// A contiguous, non-empty range of words: `[start, start + size *
/// WORD_SIZE)` in byte terms.
///
/// `start` is an absolute byte address into the managed region (see
/// `region.rs`), not an offset.  `size` is a word count, never zero:
/// a `Chunk` of size zero would be indistinguishable from a gap, and
/// the registries rely on strictly-positive sizes to detect adjacency
/// during coalescing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Chunk {
    pub start: usize,
    pub size: usize,
}

impl Chunk {
    #[requires(size > 0, "Chunks never represent an empty range.")]
    pub fn new(start: usize, size: usize) -> Chunk {
        Chunk { start, size }
    }

    /// The address one past the last byte in this chunk.
    ///
    /// `size` is a word count, not a byte count, so it must be scaled
    /// by `WORD_SIZE` before it can be added to the byte address
    /// `start` — unlike the C original, where `start` is itself a
    /// `uintptr_t *` and pointer arithmetic does that scaling for free.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.size * WORD_SIZE
    }

    /// Whether `addr` falls inside `[start, start + size * WORD_SIZE)`.
    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        self.start <= addr && addr < self.end()
    }

    /// Whether `self` and `other` are adjacent, i.e. `self` ends
    /// exactly where `other` begins.  Used by `ChunkList::merge` to
    /// decide whether to coalesce two free chunks into one.
    #[inline]
    pub fn touches(&self, other: &Chunk) -> bool {
        self.end() == other.start
    }
}
