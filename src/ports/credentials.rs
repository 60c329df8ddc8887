use crate::domain::DomainError;

/// Port for the stored API credential.
///
/// The single injected accessor for the credential: both remote clients
/// read it here before every call, so an edit in settings takes effect
/// mid-session. No redaction or rotation policy is defined.
pub trait CredentialStore: Send + Sync {
    /// The stored credential, if any. Absence blocks recording start.
    fn api_key(&self) -> Option<String>;

    /// Persist a new credential.
    fn set_api_key(&self, key: &str) -> Result<(), DomainError>;
}
