//! The root region: the pair of addresses bracketing the native call
//! stack that the collector treats as its root set.
//!
//! `stack_base` is the one piece of state in this crate that is
//! genuinely singleton (see §5 and §10.3 of the design spec): it must
//! be recorded once, near program start, before any allocation whose
//! surviving chunks should be traceable. Everything else the
//! allocator and collector touch is reachable through an owned
//! `Heap`/`Collector` value.
//!
//! The source this crate is rewritten from assumes one process, one
//! call stack, one `stack_base`. A Rust program may run many OS
//! threads, each with its own call stack, so `stack_base` here is
//! `thread_local` rather than truly process-global: the single-stack
//! pedagogical contract becomes a single-stack-per-thread contract,
//! which is the natural reading of it given the Non-goal that rules
//! out cross-thread collection in the first place.
use std::cell::Cell;

use crate::chunk::WORD_SIZE;

thread_local! {
    static STACK_BASE: Cell<Option<usize>> = Cell::new(None);
}

/// Returns the address of `value`, without reading through it.
///
/// This is a plain pointer-to-integer cast, not a dereference, so it
/// needs no `unsafe`: it is the standard way for an embedding program
/// to hand the collector the address of one of its own stack frames.
#[inline]
pub fn address_of<T>(value: &T) -> usize {
    value as *const T as usize
}

/// Records `base` as the process's `stack_base`.
///
/// Must be called exactly once, before the first call to `collect`,
/// with the address of a stack frame at or near program entry (the
/// wider the span from that frame down to the frame active at
/// collection time, the more of the program's locals are treated as
/// roots). Calling this twice is a programming error: `stack_base`
/// has single-assignment semantics by contract.
pub fn init_stack_base(base: usize) {
    STACK_BASE.with(|cell| {
        assert!(cell.get().is_none(), "stack_base must be initialized exactly once");
        cell.set(Some(base));
    });
}

/// Returns the previously recorded `stack_base`.
///
/// Panics if `init_stack_base` was never called on this thread:
/// collecting without a root region is a programming error, not a
/// recoverable condition.
pub fn stack_base() -> usize {
    STACK_BASE.with(|cell| {
        cell.get()
            .expect("stack_base was never initialized; call roots::init_stack_base first")
    })
}

/// Returns whether `init_stack_base` has been called yet on this
/// thread. Useful for tests that want to initialize lazily without
/// tripping the single-assignment assertion across test functions
/// that happen to share a thread.
pub fn is_initialized() -> bool {
    STACK_BASE.with(|cell| cell.get().is_some())
}

/// Reads the word stored at `addr`, treating `addr` as an address on
/// the native call stack rather than inside the managed region.
///
/// # Safety
///
/// `addr` must be a word-aligned address that is currently part of
/// the process's call stack (between the collector's own frame and
/// `stack_base`). This is the platform-specific unsafe primitive the
/// design notes call for: conservative stack scanning fundamentally
/// requires reading stack slots without knowing whether their
/// contents were ever written as a `usize`, which is exactly what the
/// C original does by treating `uintptr_t *` as a window onto raw
/// stack memory.
#[inline]
pub unsafe fn read_stack_word(addr: usize) -> usize {
    *(addr as *const usize)
}

/// Clamps `[stack_top, stack_base]` to a well-formed, word-aligned,
/// half-open scan range `[low, high)`, asserting the down-growing
/// stack assumption the design notes call out as an open question.
///
/// The reference algorithm scans from the current frame (`stack_top`)
/// up to `stack_base + one word`. That only makes sense if the stack
/// grows toward lower addresses, which is true of every mainstream
/// target this crate is written for (x86-64, AArch64 in its default
/// configuration). Rather than silently mishandling an up-growing
/// target, this is asserted here, at the single call site that turns
/// raw stack addresses into a scan range.
pub fn scan_range(stack_top: usize, stack_base: usize) -> (usize, usize) {
    assert!(
        stack_top <= stack_base,
        "conservative stack scan assumes a downward-growing call stack \
         (stack_top {:#x} should be <= stack_base {:#x})",
        stack_top,
        stack_base
    );

    (stack_top, stack_base + WORD_SIZE)
}
