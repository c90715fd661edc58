pub mod fault;
pub use fault::{AccessKind, Fault};

pub mod outcome;
pub use outcome::RunOutcome;

pub mod mode;
pub use mode::PrivilegeMode;

pub mod layout;
