/// Adds two integers.
pub mod add;

/// Sleeps before succeeding, to simulate slow work.
pub mod delay;

/// Always fails.
pub mod failing;

pub use add::AddJob;
pub use delay::DelayJob;
pub use failing::FailingJob;
