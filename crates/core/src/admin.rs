//! Shared-password admin gate.
//!
//! A casual deterrent for the upload and admin surfaces, not a security
//! boundary: one static password, compared per request, no session or token.

use crate::error::CoreError;

/// Password used when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "VASACHA";

#[derive(Debug, Clone)]
pub struct AdminGate {
    password: String,
}

impl AdminGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Compare `candidate` with the configured password.
    pub fn check(&self, candidate: &str) -> bool {
        let expected = self.password.as_bytes();
        let given = candidate.as_bytes();
        // Length-independent scan so timing does not reveal the prefix.
        let mut diff = expected.len() ^ given.len();
        for (i, b) in expected.iter().enumerate() {
            diff |= usize::from(b ^ given.get(i).copied().unwrap_or(0));
        }
        diff == 0
    }

    pub fn verify(&self, candidate: Option<&str>) -> Result<(), CoreError> {
        match candidate {
            Some(c) if self.check(c) => Ok(()),
            Some(_) => Err(CoreError::Unauthorized("Incorrect password".into())),
            None => Err(CoreError::Unauthorized("Admin password required".into())),
        }
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_PASSWORD)
    }
}
