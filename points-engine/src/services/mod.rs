//! Engine services: configuration access, notification dispatch, and the
//! transaction earning flow.

pub mod config_service;
pub mod earning;
pub mod notifier;

pub use config_service::ConfigService;
pub use earning::{EarnOutcome, EarnRequest, EarningError, EarningService};
pub use notifier::{Notifier, NotifyError, TracingNotifier, run_rejection_listener};
