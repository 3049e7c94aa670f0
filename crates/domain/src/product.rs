use chrono::{DateTime, Utc};
use common::{Money, ProductId, ProfileId};
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// The catalog itself (naming, descriptions, search) is an external
/// collaborator; the core only ever mutates `stock_quantity`, and only
/// through the stock ledger's atomic adjust path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// The business profile that sells this product.
    pub seller_profile: ProfileId,
    pub name: String,
    /// Current unit price. Orders snapshot this at placement time.
    pub price: Money,
    /// Units on hand. Never negative in any committed state.
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields required to register a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub seller_profile: ProfileId,
    pub name: String,
    pub price: Money,
    pub stock_quantity: i32,
}
