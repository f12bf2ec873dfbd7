//! Errors raised while wiring up the C++ bridge

use cs2modes_core::HostError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The bridge passed a null function table
    #[error("Host function table is null")]
    NullTable,

    /// A required function pointer was not filled in
    #[error("Host function table is missing '{0}'")]
    MissingFunction(&'static str),

    #[error(transparent)]
    Host(#[from] HostError),
}
