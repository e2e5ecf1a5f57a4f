//! Reset-token delivery abstraction.
//!
//! Issuance does not send the token anywhere: delivery (email, display) is an
//! external collaborator's responsibility, and this trait is the seam where
//! that collaborator plugs in. The subsystem's contract ends at handing over
//! the raw/hashed pair.

use anyhow::Result;
use tracing::info;

/// Delivery seam for freshly issued reset tokens.
pub trait ResetTokenSender: Send + Sync {
    /// Hand off the raw token for one-time delivery to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the hand-off fails; the caller logs it and still
    /// answers the request neutrally.
    fn send(&self, email: &str, raw_token: &str) -> Result<()>;
}

/// Local dev sender that records the issuance without delivering anything.
/// The raw token is never written to logs.
#[derive(Clone, Debug)]
pub struct LogResetSender;

impl ResetTokenSender for LogResetSender {
    fn send(&self, email: &str, _raw_token: &str) -> Result<()> {
        info!(to_email = %email, "password reset token issued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sender_accepts_handoff() {
        assert!(LogResetSender.send("a@b.com", "raw-token").is_ok());
    }
}
