pub mod clock;
pub mod output;
pub mod telemetry;

pub use clock::*;
pub use output::*;
pub use telemetry::*;
