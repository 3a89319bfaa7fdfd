//! A bounded, thread-safe queue that retains the most recently inserted
//! values.
//!
//! Inserting into a full [`RecentQueue`](sync::RecentQueue) evicts the
//! oldest value, so producers never block. Consumers can wait for a value to
//! become available, either by blocking the calling thread or by awaiting a
//! future.
#![deny(missing_docs)]
#![deny(unreachable_pub)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod sync;
mod trace;

pub use trace::init_tracing;
