pub mod liability;
pub mod rules;

pub use liability::{calculate, LiabilityBreakdown};
pub use rules::{FiscalYear, TaxRules};
