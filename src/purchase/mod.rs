//! Purchase planning: which units to buy with this turn's budget.

pub mod ledger;
pub mod optimizer;

pub use ledger::{MixScore, PurchaseLedger, PurchaseMix};
pub use optimizer::{PurchaseConfig, PurchaseError, PurchaseOptimizer, PurchaseRequest};
