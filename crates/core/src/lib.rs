pub mod category;
pub mod money;
pub mod normalize;
pub mod period;
pub mod transaction;

pub use category::{
    CategorizationResult, CategoryAssignment, CategoryCatalog, CategoryGroup, TransactionKind,
    ESSENTIALS, MISCELLANEOUS,
};
pub use normalize::{contains_either_way, normalize};
pub use period::{budget_period, BudgetMonth};
pub use transaction::{derive_id, BankTransaction};
