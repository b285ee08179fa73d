use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused the write. Raised by the fault-injection hook;
    /// a real backend would raise it for permission or quota failures.
    #[error("write to `{0}` rejected")]
    WriteRejected(String),

    /// Internal lock poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}
