//! The conservative mark-and-sweep collector.
//!
//! Marking is iterative, not recursive: the reference design in the
//! original C recurses directly into `mark_region` whenever it
//! discovers a new live chunk, relying on the reachability bitmap to
//! bound recursion depth. This rewrite instead pushes discovered
//! chunk indices onto an explicit worklist and drains it, so host
//! stack usage is independent of how deep the chunk graph gets (see
//! §9 of the design spec).
use crate::chunk::WORD_SIZE;
use crate::heap::Heap;
use crate::roots;

/// Where a scanned word range lives. The collector reads the native
/// call stack and the managed region through different unsafe
/// primitives (`roots::read_stack_word` vs. `Region::read_word`)
/// because they have different ownership stories, even though both
/// ultimately do the same raw pointer dereference.
enum ScanSource {
    Stack,
    Region,
}

/// Runs one mark-and-sweep collection over `heap`.
///
/// Reclaims every allocated chunk that is not transitively reachable,
/// by conservative pointer interpretation, from the root region
/// (`roots::stack_base()` down to the collector's own frame). Safe to
/// call at any point; afterward the partition invariant holds, with
/// at least as much free space as before.
///
/// # Panics
///
/// Panics if `roots::init_stack_base` was never called.
pub fn collect(heap: &mut Heap) {
    let stack_top = {
        let here: u8 = 0;
        roots::address_of(&here)
    };
    let (low, high) = roots::scan_range(stack_top, roots::stack_base());

    let mut bitmap = vec![false; heap.allocated().len()];
    let mut worklist: Vec<usize> = Vec::new();

    mark_region(&*heap, &mut bitmap, &mut worklist, low, high, ScanSource::Stack);

    while let Some(index) = worklist.pop() {
        let chunk = heap.allocated().get(index);
        mark_region(
            &*heap,
            &mut bitmap,
            &mut worklist,
            chunk.start,
            chunk.end(),
            ScanSource::Region,
        );
    }

    let mut to_free = Vec::new();
    for (index, chunk) in heap.allocated().iter().enumerate() {
        if !bitmap[index] {
            to_free.push(chunk.start);
        }
    }

    for ptr in to_free {
        heap.free(Some(ptr));
    }
}

/// For each word-aligned position in `[start, end)`, reads a
/// candidate address and tests it against every chunk in `heap`'s
/// allocated registry. The first time a chunk is found live, its
/// bitmap entry is set and its index is pushed onto `worklist` so its
/// own contents get scanned in turn.
fn mark_region(
    heap: &Heap,
    bitmap: &mut [bool],
    worklist: &mut Vec<usize>,
    start: usize,
    end: usize,
    source: ScanSource,
) {
    let mut p = start;
    while p < end {
        let candidate = match source {
            ScanSource::Stack => unsafe { roots::read_stack_word(p) },
            ScanSource::Region => unsafe { heap.region().read_word(p) },
        };

        for (index, chunk) in heap.allocated().iter().enumerate() {
            if chunk.contains(candidate) && !bitmap[index] {
                bitmap[index] = true;
                worklist.push(index);
            }
        }

        p += WORD_SIZE;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::demo_tree;
    use crate::roots;

    fn ensure_stack_base() {
        // `stack_base` is thread-local (see roots.rs) and has
        // single-assignment semantics per thread. cargo runs each
        // test on its own thread by default, so each test's first
        // call here initializes that thread's base; later calls on a
        // reused thread are no-ops rather than tripping the
        // single-assignment assertion.
        if !roots::is_initialized() {
            let here: u8 = 0;
            roots::init_stack_base(roots::address_of(&here));
        }
    }

    // S5 — conservative trace of a binary tree.
    #[test]
    fn reachable_tree_survives_collection_unreachable_one_does_not() {
        ensure_stack_base();
        let mut heap = Heap::new();

        let mut root = Some(demo_tree::build_complete_tree(&mut heap, 3));
        assert_eq!(heap.allocated().len(), 15);

        collect(&mut heap);
        assert_eq!(heap.allocated().len(), 15, "the tree is still rooted on the stack");

        root.take();
        demo_tree::clobber_stack();
        collect(&mut heap);
        assert_eq!(heap.allocated().len(), 0, "nothing roots the tree anymore");
        assert_eq!(heap.free_list().len(), 1, "the region collapses back to one free chunk");
    }

    // S6 — cycle tolerance.
    #[test]
    fn unrooted_cycle_is_fully_reclaimed() {
        ensure_stack_base();
        let mut heap = Heap::new();

        demo_tree::build_unrooted_cycle(&mut heap);
        assert_eq!(heap.allocated().len(), 2);

        demo_tree::clobber_stack();
        collect(&mut heap);
        assert_eq!(heap.allocated().len(), 0);
    }

    // Collector safety/progress + idempotence.
    #[test]
    fn collect_twice_in_a_row_is_idempotent() {
        ensure_stack_base();
        let mut heap = Heap::new();

        let root = demo_tree::build_complete_tree(&mut heap, 2);
        collect(&mut heap);
        let after_first: Vec<_> = heap.allocated().iter().collect();

        collect(&mut heap);
        let after_second: Vec<_> = heap.allocated().iter().collect();

        assert_eq!(after_first, after_second);
        drop(root);
    }
}
