//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod change_feed;
pub mod generator;
pub mod storage;

pub use change_feed::{ChangePublisher, ChangeSubscriber};
pub use generator::DataGenerator;
pub use storage::{PlayerRepository, RefreshOutcome, RefreshPlan, RefreshPlanner, TeamRepository};
