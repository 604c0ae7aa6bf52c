pub mod cancel;
pub mod controller;
pub mod machine;
pub mod snapshot;

pub use cancel::CancelToken;
pub use controller::{RunOutcome, SimulationController};
pub use machine::{Machine, StepReport};
pub use snapshot::{PreviewLimits, Progress, SimSnapshot};
