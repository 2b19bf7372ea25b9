//! A fixed-capacity bump-style region allocator paired with a
//! conservative mark-and-sweep garbage collector over that region.
//!
//! The allocator (`Heap`) maintains two sorted, non-overlapping
//! registries of `Chunk`s — one for live allocations, one for free
//! space — over a single fixed-size `Region`. `collect` conservatively
//! scans the native call stack and, transitively, every reachable
//! chunk's own contents, treating any word-sized value that falls
//! inside a live chunk's address range as a pointer into it. Anything
//! not reached that way is swept back into the free registry.
//!
//! ```
//! use wordheap::{Heap, roots};
//!
//! let entry_point: u8 = 0;
//! roots::init_stack_base(roots::address_of(&entry_point));
//!
//! let mut heap = Heap::new();
//! let ptr = heap.allocate(24).expect("region has room");
//! heap.free(Some(ptr));
//! ```
pub mod chunk;
pub mod chunk_list;
pub mod collector;
pub mod demo_tree;
pub mod heap;
pub mod region;
pub mod roots;

pub use chunk::Chunk;
pub use chunk_list::ChunkList;
pub use collector::collect;
pub use heap::Heap;
pub use region::Region;
