//! A `ChunkList` is a bounded, sorted, non-overlapping sequence of
//! `Chunk`s.  It is the allocator's own bookkeeping structure, so it
//! must not itself allocate: storage is a fixed-size inline array,
//! exactly like the teacher crate's `MagazineImpl::allocations`.
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

use std::mem::MaybeUninit;

use crate::chunk::Chunk;

#[cfg(not(feature = "test_only_small_constants"))]
pub const CHUNK_LIST_CAPACITY: usize = 1024;

#[cfg(feature = "test_only_small_constants")]
pub const CHUNK_LIST_CAPACITY: usize = 8;

/// A sorted, bounded, non-overlapping collection of `Chunk`s.
///
/// The `chunks` array is populated from the bottom up: the first
/// `count` entries hold valid chunks in ascending `start` order, and
/// the remainder is uninitialised garbage that must never be read.
pub struct ChunkList {
    count: usize,
    chunks: [MaybeUninit<Chunk>; CHUNK_LIST_CAPACITY],
}

impl Default for ChunkList {
    fn default() -> Self {
        ChunkList {
            count: 0,
            chunks: [MaybeUninit::uninit(); CHUNK_LIST_CAPACITY],
        }
    }
}

impl ChunkList {
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Reads the chunk at `index`.  Only valid for `index < self.len()`.
    #[requires(index < self.count, "index must name a populated slot.")]
    #[inline]
    pub fn get(&self, index: usize) -> Chunk {
        unsafe { self.chunks[index].assume_init() }
    }

    pub fn iter(&self) -> impl Iterator<Item = Chunk> + '_ {
        (0..self.count).map(move |i| self.get(i))
    }

    /// Checks that `self` is sorted by ascending `start` with no
    /// overlaps.  Used only by contracts and tests; not on any hot
    /// path.
    pub fn check_rep(&self) -> bool {
        (1..self.count).all(|i| {
            let prev = self.get(i - 1);
            let cur = self.get(i);
            prev.end() <= cur.start
        })
    }

    /// Appends `(start, size)`, then bubbles it leftward until the
    /// predecessor's `start` is less than the new chunk's `start`.
    ///
    /// This assumes the caller is not inserting a chunk that overlaps
    /// an existing one; `merge` and the allocator are careful to
    /// uphold that. Fails (assertion) if capacity is exceeded.
    #[requires(self.count < CHUNK_LIST_CAPACITY, "registry must have room for one more chunk.")]
    #[ensures(self.count == old(self.count) + 1, "insert always grows the registry by one.")]
    #[ensures(self.check_rep(), "registry stays sorted and non-overlapping.")]
    pub fn insert(&mut self, start: usize, size: usize) {
        assert!(
            self.count < CHUNK_LIST_CAPACITY,
            "chunk list capacity ({}) exceeded",
            CHUNK_LIST_CAPACITY
        );

        let mut i = self.count;
        self.chunks[i] = MaybeUninit::new(Chunk::new(start, size));
        self.count += 1;

        while i > 0 && self.get(i).start < self.get(i - 1).start {
            self.chunks.swap(i, i - 1);
            i -= 1;
        }
    }

    /// Linear scan returning the index whose chunk's `start` equals
    /// `addr` exactly, or `None`.
    pub fn find(&self, addr: usize) -> Option<usize> {
        (0..self.count).find(|&i| self.get(i).start == addr)
    }

    /// Shifts the suffix left by one, removing the chunk at `index`.
    #[requires(index < self.count, "index must name a populated slot.")]
    #[ensures(self.count == old(self.count) - 1, "remove always shrinks the registry by one.")]
    pub fn remove(&mut self, index: usize) -> Chunk {
        assert!(index < self.count, "chunk list index {} out of range", index);

        let removed = self.get(index);
        for i in index..self.count - 1 {
            self.chunks[i] = self.chunks[i + 1];
        }
        self.count -= 1;
        removed
    }

    /// Empties `self` without returning anything; used before a merge
    /// repopulates the registry from scratch.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Resets `dst` to empty, then inserts every chunk of `src` in
    /// order, extending `dst`'s last chunk in place whenever it ends
    /// exactly where the next chunk of `src` begins.
    ///
    /// Because `src` is sorted and non-overlapping, `dst` emerges
    /// sorted, non-overlapping, and with no two adjacent chunks
    /// contiguous (the post-merge minimality invariant).
    #[ensures(dst.check_rep(), "merged registry stays sorted and non-overlapping.")]
    pub fn merge(dst: &mut ChunkList, src: &ChunkList) {
        dst.clear();

        for chunk in src.iter() {
            let extended = if dst.count > 0 {
                let mut top = dst.get(dst.count - 1);
                if top.touches(&chunk) {
                    top.size += chunk.size;
                    dst.chunks[dst.count - 1] = MaybeUninit::new(top);
                    true
                } else {
                    false
                }
            } else {
                false
            };

            if !extended {
                dst.insert(chunk.start, chunk.size);
            }
        }
    }

    /// Prints `<name> Chunks (<count>):` followed by one
    /// `  start: <address>, size: <word-count>` line per chunk.
    ///
    /// Diagnostic only; not part of the crate's stable surface.
    pub fn dump(&self, name: &str) {
        println!("{} Chunks ({}):", name, self.count);
        for chunk in self.iter() {
            println!("  start: {:#x}, size: {}", chunk.start, chunk.size);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chunk::WORD_SIZE;
    use proptest::collection::vec;
    use proptest::prelude::*;

    #[test]
    fn insert_keeps_sorted_order() {
        let mut list = ChunkList::new();
        list.insert(100, 4);
        list.insert(50, 4);
        list.insert(200, 4);

        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0).start, 50);
        assert_eq!(list.get(1).start, 100);
        assert_eq!(list.get(2).start, 200);
        assert!(list.check_rep());
    }

    #[test]
    fn find_returns_exact_start_match() {
        let mut list = ChunkList::new();
        list.insert(100, 4);
        list.insert(200, 8);

        assert_eq!(list.find(200), Some(1));
        assert_eq!(list.find(201), None);
    }

    #[test]
    fn remove_shifts_suffix_left() {
        let mut list = ChunkList::new();
        list.insert(100, 4);
        list.insert(200, 4);
        list.insert(300, 4);

        let removed = list.remove(1);
        assert_eq!(removed.start, 200);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).start, 100);
        assert_eq!(list.get(1).start, 300);
    }

    #[test]
    #[should_panic]
    fn remove_out_of_range_asserts() {
        let mut list = ChunkList::new();
        list.insert(100, 4);
        list.remove(5);
    }

    #[test]
    fn merge_coalesces_contiguous_chunks() {
        let mut src = ChunkList::new();
        src.insert(0, 4);
        src.insert(4 * WORD_SIZE, 4);
        src.insert(9 * WORD_SIZE, 4); // not contiguous with the previous pair

        let mut dst = ChunkList::new();
        ChunkList::merge(&mut dst, &src);

        assert_eq!(dst.len(), 2);
        assert_eq!(dst.get(0), Chunk::new(0, 8));
        assert_eq!(dst.get(1), Chunk::new(9 * WORD_SIZE, 4));
    }

    #[test]
    fn merge_of_non_adjacent_chunks_is_a_copy() {
        let mut src = ChunkList::new();
        src.insert(0, 4);
        src.insert(100, 4);

        let mut dst = ChunkList::new();
        ChunkList::merge(&mut dst, &src);

        assert_eq!(dst.len(), 2);
        assert_eq!(dst.get(0), Chunk::new(0, 4));
        assert_eq!(dst.get(1), Chunk::new(100, 4));
    }

    proptest! {
        // Insert a random sequence of disjoint chunks, in random order,
        // and check the registry always stays sorted and non-overlapping.
        #[test]
        fn insert_any_order_stays_sorted(mut starts in vec((0..1000usize).prop_map(|i| i * 4 * WORD_SIZE), 1..CHUNK_LIST_CAPACITY.min(64))) {
            starts.sort_unstable();
            starts.dedup();

            let mut list = ChunkList::new();
            for &start in starts.iter() {
                list.insert(start, 4);
            }

            prop_assert!(list.check_rep());
            prop_assert_eq!(list.len(), starts.len());
        }

        // Merging a sorted, non-overlapping chunk list must always
        // leave the destination sorted, non-overlapping, and with no
        // two adjacent chunks touching.
        #[test]
        fn merge_is_always_minimal(mut starts in vec((0..1000usize).prop_map(|i| i * 4 * WORD_SIZE), 1..CHUNK_LIST_CAPACITY.min(64))) {
            starts.sort_unstable();
            starts.dedup();

            let mut src = ChunkList::new();
            for &start in starts.iter() {
                src.insert(start, 4);
            }

            let mut dst = ChunkList::new();
            ChunkList::merge(&mut dst, &src);

            prop_assert!(dst.check_rep());
            for i in 1..dst.len() {
                prop_assert!(!dst.get(i - 1).touches(&dst.get(i)));
            }

            let src_total: usize = src.iter().map(|c| c.size).sum();
            let dst_total: usize = dst.iter().map(|c| c.size).sum();
            prop_assert_eq!(src_total, dst_total);
        }
    }
}
