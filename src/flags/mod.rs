//! # Feature Flags
//!
//! Runtime flags with staged rollout, user/environment/tenant targeting,
//! dependencies, expiry, a master kill switch and a set of security flags
//! that cannot be turned off while the system is running.
//!
//! ```rust,no_run
//! use agent_trust::flags::{EvaluationContext, FeatureFlagManager, FlagConfig};
//!
//! let mut flags = FeatureFlagManager::with_defaults();
//! flags.configure(FlagConfig::new("predictive_routing").rollout(25.0)).unwrap();
//!
//! let ctx = EvaluationContext::for_user("user-17");
//! if flags.is_enabled("predictive_routing", &ctx) {
//!     // new path
//! }
//! ```

pub mod error;
pub mod flag;
pub mod global;
pub mod manager;
pub mod rollout;

pub use error::FlagError;
pub use flag::{
    EvaluationContext, EvaluationRule, FlagConfig, FlagEvaluation, FlagMetadata, FlagSnapshot,
};
pub use global::{global, init_global, SharedFlagManager};
pub use manager::{FeatureFlagManager, FlagsConfig, EMERGENCY_MARKER};
pub use rollout::{in_rollout, rollout_bucket};
