//! Process-wide flag manager.
//!
//! Install once at startup with [`init_global`]; read anywhere via [`global`].

use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use super::error::FlagError;
use super::manager::FeatureFlagManager;

/// Shared, lock-guarded manager handle.
pub type SharedFlagManager = Arc<RwLock<FeatureFlagManager>>;

static GLOBAL_FLAGS: OnceCell<SharedFlagManager> = OnceCell::new();

/// Install `manager` as the process-wide instance. Fails if one is already installed.
pub fn init_global(manager: FeatureFlagManager) -> Result<SharedFlagManager, FlagError> {
    let shared = Arc::new(RwLock::new(manager));
    GLOBAL_FLAGS
        .set(Arc::clone(&shared))
        .map_err(|_| FlagError::AlreadyInitialized)?;
    log::debug!("Global feature flag manager installed");
    Ok(shared)
}

/// The process-wide manager, if installed.
pub fn global() -> Option<SharedFlagManager> {
    GLOBAL_FLAGS.get().cloned()
}
