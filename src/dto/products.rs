use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub inventory: i32,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub inventory: Option<i32>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

/// A product plus its review aggregate, derived at query time.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithRating {
    pub product: Product,
    pub average_rating: f64,
    pub review_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductWithRating>)]
    pub items: Vec<ProductWithRating>,
}

/// Raw product rows for admin views; no review aggregates attached.
#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AdminProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchProductsRequest {
    pub query: Option<String>,
    pub limit: Option<i64>,
    pub category_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RankedProduct {
    pub product: Product,
    pub average_rating: f64,
    pub review_count: i64,
    pub relevance_score: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResults {
    pub products: Vec<RankedProduct>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SuggestionList {
    #[schema(value_type = Vec<String>)]
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}
