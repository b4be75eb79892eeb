use std::time::Duration;

use crate::patterns::CompiledPatterns;
use crate::surface::BrowsingSurface;

/// Delay before probing, so late-injected overlays have rendered.
pub const CONSENT_DELAY: Duration = Duration::from_millis(500);

/// Clicks the first consent button on the current page, if any.
///
/// Never fails: a missing overlay and a failed click both come back as
/// `false`. Running it on a page without an overlay is a no-op.
pub async fn dismiss_consent_if_present(
    surface: &mut dyn BrowsingSurface,
    patterns: &CompiledPatterns,
    delay: Duration,
) -> bool {
    surface.pause(delay).await;
    match surface.click(&patterns.consent).await {
        Ok(clicked) => {
            if clicked {
                tracing::debug!("consent overlay dismissed");
            }
            clicked
        }
        Err(e) => {
            tracing::debug!(error = %e, "consent click failed");
            false
        }
    }
}
