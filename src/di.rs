//! Dependency injection infrastructure.
//!
//! This module provides compile-time dependency resolution using the
//! `FromRef` trait. The application `Context` implements `FromRef` for each
//! of its shared dependencies, so tool handlers resolve what they need
//! without knowing how the context is assembled.
//!
//! # Example
//!
//! ```ignore
//! use graforest::di::FromRef;
//!
//! let ctx = Context::new(config, credential)?;
//! let graph = GraphClient::from_ref(&ctx);
//! ```

/// Trait for extracting a value from a reference to another type.
///
/// Types that implement `FromRef<T>` can be extracted from `&T`.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Blanket implementation: any Clone type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}
