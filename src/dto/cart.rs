use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Cart;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    #[schema(value_type = Option<Object>)]
    pub variant: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

/// Slice of the product a cart line needs to render.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineProduct {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub inventory: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: CartLineProduct,
    pub quantity: i32,
    pub price_snapshot: i64,
    #[schema(value_type = Object)]
    pub variant: Value,
}

/// Cart with derived totals; both sums are recomputed on every read and
/// never persisted.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartWithTotals {
    pub cart: Cart,
    pub items: Vec<CartLine>,
    pub total_amount: i64,
    pub total_items: i64,
}
