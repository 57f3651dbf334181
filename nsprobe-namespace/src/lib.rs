//! Network namespace sessions pinned to a dedicated OS thread
//!
//! Namespace membership belongs to an OS thread, while tokio moves tasks
//! freely between its worker threads. This crate provides:
//! - [`NamespaceHandle`] - owned descriptor of a kernel namespace
//! - [`NamespaceOps`] - the switch primitives, with [`Netns`] for the real
//!   kernel and [`MockNamespaces`] as a deterministic double
//! - [`NamespaceSession`] - switch into a target, restore on every exit path
//! - [`ExecutionUnit`] - run a closure on a pinned OS thread that no other
//!   task can ever be scheduled onto
//! - [`ExclusivityProbe`] - diagnostic check that runtime tasks never see a
//!   foreign namespace

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod handle;
pub mod inspect;
pub mod mock;
pub mod ops;
pub mod probe;
pub mod session;
pub mod unit;

pub use handle::NamespaceHandle;
pub use mock::{MockHandle, MockNamespaces};
pub use ops::{NamespaceOps, Netns};
pub use probe::{ExclusivityProbe, ProbeOutcome, RunningProbe};
pub use session::{NamespaceSession, session_active};
pub use unit::{ExecutionUnit, PinnedUnit, with_namespace};
