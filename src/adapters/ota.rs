//! OTA boot validation.
//!
//! Images flashed over the air boot in a pending-verify state.  The
//! dispenser marks itself valid once it reaches `main`, before touching
//! any output, so a crashing image rolls back on the next reset.

#[cfg(target_os = "espidf")]
use log::{info, warn};

/// Mark the running image valid and cancel any pending rollback.
#[cfg(target_os = "espidf")]
pub fn check_rollback() {
    match esp_ota::mark_app_valid() {
        Ok(()) => info!("OTA: firmware marked valid (rollback cancelled)"),
        Err(e) => warn!("OTA: mark_app_valid failed: {:?}", e),
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn check_rollback() {
    log::info!("OTA rollback check (simulation): skipped");
}
