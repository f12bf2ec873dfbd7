//! Error types for the plugin runtime

/// Error type for host installation
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// A host was already installed for this process
    #[error("Game host already installed")]
    AlreadyInstalled,

    /// No host has been installed yet
    #[error("Game host not installed")]
    NotInstalled,
}
