pub mod scanner;

pub use scanner::{PairOutcome, ScanPlan, Scanner, SweepReport};
