use crate::providers::ProviderKind;

/// Admission policy for provider sign-ins.
///
/// Schedulo admits a single provider: Google. Only Google sessions can reach the
/// Calendar API, so other identities would sign in to a product they cannot use.
/// Providers the gate refuses are hidden from the listing and turned away before
/// the browser is sent to their consent page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignInGate {
    admitted: ProviderKind,
}

impl SignInGate {
    pub const fn google_only() -> Self {
        Self {
            admitted: ProviderKind::Google,
        }
    }

    pub fn admits(&self, provider: &str) -> bool {
        provider
            .parse::<ProviderKind>()
            .is_ok_and(|kind| kind == self.admitted)
    }
}

impl Default for SignInGate {
    fn default() -> Self {
        Self::google_only()
    }
}
