/*
 * tinyview-system-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Runtime abstraction layer for tinyview filesystem access.
 *
 * This crate provides a trait-based abstraction for the filesystem
 * capabilities the template engine consumes:
 *
 * - NativeRuntime: Full filesystem access using std
 * - MemoryRuntime: In-memory virtual filesystem
 * - RootedRuntime: Confines any runtime to a boundary directory (decorator pattern)
 */

mod memory;
mod native;
mod rooted;
mod traits;

// Re-export core types (API surface)
pub use traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

// Re-export runtime implementations
pub use memory::MemoryRuntime;
pub use native::NativeRuntime;
pub use rooted::RootedRuntime;

/// Create a default runtime for the current platform.
pub fn default_runtime() -> NativeRuntime {
    NativeRuntime::new()
}
