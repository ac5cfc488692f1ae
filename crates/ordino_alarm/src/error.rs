use thiserror::Error;

/// Errors surfaced by the client listener.
///
/// Registration failures are deliberately absent: a failed registry write
/// during initialization or token rotation is logged as a soft warning and
/// never blocks app usage.
#[derive(Error, Debug)]
pub enum ListenError {
    /// The platform push channel failed (permission prompt, token mint or
    /// token deletion)
    #[error("Push channel error: {0}")]
    ChannelError(String),

    /// The device registry rejected an operation
    #[error("Registry error: {0}")]
    RegistryError(String),
}
