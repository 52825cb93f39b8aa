//! Registry error types

/// Error type for registry operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The broadcaster has been shut down
    #[error("event source is closed")]
    Closed,
}
