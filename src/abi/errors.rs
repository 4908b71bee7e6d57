use thiserror::Error;

/// Errors produced by the ABI codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    /// The function or event is not part of the loaded interface
    #[error("{0} is not part of the contract interface")]
    WrongInterface(String),

    /// A value does not match the type it is encoded as
    #[error("Could not encode: {0}")]
    CouldNotEncode(String),

    /// The byte layout is malformed
    #[error("Could not decode: {0}")]
    CouldNotDecode(String),
}
