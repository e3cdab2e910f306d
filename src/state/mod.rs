//! Login conversation state management

pub mod machine;
pub mod session;

pub use machine::{LoginStep, LoginStepMachine, StepOutcome};
pub use session::SessionStore;
