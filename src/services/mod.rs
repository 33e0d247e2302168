//! Service layer - detection, route planning, session orchestration

pub mod detector;
pub mod escape;
pub mod monitor;
pub mod seeder;
pub mod walk;

pub use detector::{Transition, TransitionDetector, TransitionKind};
pub use escape::{plan_exit_route, ExitRoute};
pub use monitor::{Monitor, MonitorEvent, MonitorState};
pub use seeder::seed_session_fences;
pub use walk::plan_walk;
