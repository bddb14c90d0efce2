use snafu::{OptionExt, ResultExt};

use crate::{
    config::KEY_KEYTAB_PRINCIPAL,
    security::{NoPrincipalSnafu, ResolvePrincipalSnafu, Result, SecurityConfiguration},
};

impl SecurityConfiguration {
    /// The principal to log in with, falling back to the short name of the login identity.
    pub fn principal(&self) -> Result<String> {
        if let Some(principal) = self.am_options().get(KEY_KEYTAB_PRINCIPAL) {
            return Ok(principal.to_string());
        }

        let login_identity = self
            .login_identity()
            .context(ResolvePrincipalSnafu)?
            .context(NoPrincipalSnafu {
                key: KEY_KEYTAB_PRINCIPAL,
            })?;
        let principal = login_identity.short_name().to_string();
        tracing::info!(
            principal = %principal,
            "No principal set in {KEY_KEYTAB_PRINCIPAL}. Will use the login identity to attempt keytab-based login"
        );
        Ok(principal)
    }
}
