use thiserror::Error;

/// The error returned by [`HashMap::at`] and [`HashMap::at_mut`] when the key
/// is absent.
///
/// [`HashMap::at`]: crate::HashMap::at
/// [`HashMap::at_mut`]: crate::HashMap::at_mut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("key not found in map")]
pub struct KeyNotFound;
