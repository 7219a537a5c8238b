use crate::inventory::{Identity, PreprocessError};
use crate::types::TargetConfig;
use tracing::debug;

/// Fills in what a target left to the local environment:
/// - an empty username becomes the operator's username
/// - the first `~` in a pki key path becomes the operator's home directory
pub fn preprocess(
    target: &mut TargetConfig,
    identity: &dyn Identity,
) -> Result<(), PreprocessError> {
    if target.user.is_empty() {
        let username = identity
            .username()
            .map_err(|reason| PreprocessError::IdentityResolutionFailed { reason })?;
        debug!("Defaulting user for {} to {}", target.host, username);
        target.user = username;
    }

    if target.is_pki() && target.auth.artifact.contains('~') {
        let home = identity
            .home_dir()
            .map_err(|reason| PreprocessError::HomeResolutionFailed { reason })?;
        target.auth.artifact = target
            .auth
            .artifact
            .replacen('~', &home.to_string_lossy(), 1);
    }

    Ok(())
}
