//! Builders for small pointer graphs over a `Heap`, used to exercise
//! the conservative collector in tests (scenarios S5/S6 of the design
//! spec).
//!
//! This is the one piece of functionality this rewrite keeps from
//! `original_source/main.c` and its sibling demo files in the pack:
//! the logic of wiring up a traceable structure out of raw
//! `heap_alloc` calls, stripped of the `main` entry point and the
//! JSON dump the spec rules out of scope.
use crate::chunk::WORD_SIZE;
use crate::heap::Heap;

/// A node is two words wide: a `left` child address and a `right`
/// child address, each `0` (never a valid region address) when absent.
const NODE_SIZE_BYTES: usize = 2 * WORD_SIZE;

/// The address of a tree built by `build_complete_tree`.
///
/// This is an ordinary `usize` with no `Drop` behavior: the whole
/// point of the type is to sit on the caller's stack as a root the
/// collector can discover, and to stop doing so the moment the caller
/// drops or overwrites it. It does not own the memory it names; only
/// the collector (or an explicit `Heap::free`) reclaims that.
#[derive(Clone, Copy)]
pub struct TreeHandle(pub usize);

/// Builds a complete binary tree of the given `depth` (depth 0 is a
/// single leaf node) directly inside `heap`'s managed region, and
/// returns a handle to the root.
///
/// A tree of depth `d` has `2^(d+1) - 1` nodes.
pub fn build_complete_tree(heap: &mut Heap, depth: u32) -> TreeHandle {
    TreeHandle(build_node(heap, depth))
}

fn build_node(heap: &mut Heap, depth: u32) -> usize {
    let (left, right) = if depth == 0 {
        (0, 0)
    } else {
        (build_node(heap, depth - 1), build_node(heap, depth - 1))
    };

    let addr = heap
        .allocate(NODE_SIZE_BYTES)
        .expect("demo tree should fit in a freshly constructed heap");

    // Safety: `addr` and `addr + WORD_SIZE` were both just carved out
    // of `heap`'s region by `allocate`, so they are word-aligned
    // addresses inside the region.
    unsafe {
        heap.region_mut().write_word(addr, left);
        heap.region_mut().write_word(addr + WORD_SIZE, right);
    }

    addr
}

/// Builds two allocated nodes whose contents point at each other and
/// returns nothing: by design, no root on the caller's stack survives
/// this call, so the pair is reachable only through its own cycle.
pub fn build_unrooted_cycle(heap: &mut Heap) {
    let a = heap.allocate(NODE_SIZE_BYTES).expect("cycle should fit");
    let b = heap.allocate(NODE_SIZE_BYTES).expect("cycle should fit");

    // Safety: both addresses were just returned by `allocate`.
    unsafe {
        heap.region_mut().write_word(a, b);
        heap.region_mut().write_word(a + WORD_SIZE, 0);
        heap.region_mut().write_word(b, a);
        heap.region_mut().write_word(b + WORD_SIZE, 0);
    }
}

/// Overwrites a sizable chunk of the caller's stack with a sentinel
/// value.
///
/// Conservative scanning reads whatever bytes currently occupy the
/// scanned range, including stale values left behind by frames that
/// have since returned. Tests that expect a chunk to be *unreachable*
/// call this first to clobber any leftover copies of that chunk's
/// address before invoking `collect`, the same way a real mutator's
/// ordinary call traffic would overwrite them given enough time.
/// `std::hint::black_box` keeps the compiler from proving the buffer
/// is dead and eliding the writes.
pub fn clobber_stack() {
    let buffer = [0usize; 256];
    std::hint::black_box(&buffer);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn complete_tree_has_the_expected_node_count() {
        let mut heap = Heap::new();
        let _root = build_complete_tree(&mut heap, 3);
        assert_eq!(heap.allocated().len(), 15);
    }

    #[test]
    fn tree_nodes_point_at_their_children() {
        let mut heap = Heap::new();
        let root = build_complete_tree(&mut heap, 1);

        let left = unsafe { heap.region().read_word(root.0) };
        let right = unsafe { heap.region().read_word(root.0 + WORD_SIZE) };

        assert_ne!(left, 0);
        assert_ne!(right, 0);
        assert_ne!(left, right);
    }

    #[test]
    fn unrooted_cycle_allocates_two_nodes_pointing_at_each_other() {
        let mut heap = Heap::new();
        build_unrooted_cycle(&mut heap);
        assert_eq!(heap.allocated().len(), 2);

        let a = heap.allocated().get(0).start;
        let b = heap.allocated().get(1).start;
        assert_eq!(unsafe { heap.region().read_word(a) }, b);
        assert_eq!(unsafe { heap.region().read_word(b) }, a);
    }
}
