use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::products::{
        CategoryList, CreateProductRequest, InventoryAdjustRequest, ProductList,
        ProductWithRating, RankedProduct, SearchProductsRequest, SearchResults, SuggestionList,
        UpdateProductRequest,
    },
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder, SuggestQuery},
    state::AppState,
};

/// Heuristic ranking for free-text search: name substring beats description
/// substring, a name prefix beats both.
pub fn relevance_score(query: &str, name: &str, description: Option<&str>) -> i32 {
    let query = query.to_lowercase();
    let name = name.to_lowercase();
    let description = description.unwrap_or_default().to_lowercase();

    let mut score = 0;
    if name.contains(&query) {
        score += 10;
    }
    if name.starts_with(&query) {
        score += 5;
    }
    if description.contains(&query) {
        score += 3;
    }
    score
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        // Rating is a derived aggregate; those results are re-sorted below.
        ProductSortBy::CreatedAt | ProductSortBy::Rating => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let products: Vec<Product> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let mut items = with_ratings(state, products).await?;
    if matches!(sort_by, ProductSortBy::Rating) {
        items.sort_by(|a, b| match sort_order {
            SortOrder::Asc => a.average_rating.total_cmp(&b.average_rating),
            SortOrder::Desc => b.average_rating.total_cmp(&a.average_rating),
        });
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductWithRating>> {
    let product = Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => product_from_entity(p),
        None => return Err(AppError::NotFound),
    };

    let mut items = with_ratings(state, vec![product]).await?;
    let item = items.remove(0);
    Ok(ApiResponse::success("Product", item, None))
}

/// Up to `limit` active products sharing the source product's category,
/// excluding the source itself.
pub async fn similar_products(
    state: &AppState,
    id: Uuid,
    limit: Option<u64>,
) -> AppResult<ApiResponse<ProductList>> {
    let source = Products::find_by_id(id).one(&state.orm).await?;
    let source = match source {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut condition = Condition::all()
        .add(Column::IsActive.eq(true))
        .add(Column::Id.ne(source.id));
    if let Some(category_id) = source.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    let products: Vec<Product> = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .limit(limit.unwrap_or(4))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let items = with_ratings(state, products).await?;
    Ok(ApiResponse::success(
        "Similar products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

/// Search endpoint behavior: fetch matching candidates, attach review
/// aggregates, then rank by relevance when a query string was given.
pub async fn search_products(
    state: &AppState,
    payload: SearchProductsRequest,
) -> AppResult<ApiResponse<SearchResults>> {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(query) = payload.query.as_ref().filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", query);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category_id) = payload.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(min_price) = payload.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = payload.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let limit = payload.limit.unwrap_or(10).clamp(1, 100) as u64;
    let products: Vec<Product> = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let rated = with_ratings(state, products).await?;
    let mut products: Vec<RankedProduct> = rated
        .into_iter()
        .map(|item| {
            let score = payload
                .query
                .as_deref()
                .map(|q| {
                    relevance_score(q, &item.product.name, item.product.description.as_deref())
                })
                .unwrap_or(0);
            RankedProduct {
                product: item.product,
                average_rating: item.average_rating,
                review_count: item.review_count,
                relevance_score: score,
            }
        })
        .collect();

    if payload.query.as_deref().is_some_and(|q| !q.is_empty()) {
        products.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    }

    Ok(ApiResponse::success(
        "Search results",
        SearchResults { products },
        Some(Meta::empty()),
    ))
}

/// Bounded list of active product names matching the query substring.
pub async fn search_suggestions(
    state: &AppState,
    query: SuggestQuery,
) -> AppResult<ApiResponse<SuggestionList>> {
    let limit = query.limit.unwrap_or(5).clamp(1, 20);
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM products WHERE is_active AND name ILIKE $1 ORDER BY name LIMIT $2",
    )
    .bind(format!("%{}%", query.q))
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let items = rows.into_iter().map(|(name,)| name).collect();
    Ok(ApiResponse::success(
        "Suggestions",
        SuggestionList { items },
        None,
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = sqlx::query_as("SELECT * FROM categories ORDER BY name")
        .fetch_all(&state.pool)
        .await?;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        None,
    ))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    match category {
        Some(category) => Ok(ApiResponse::success("Category", category, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.price < 0 || payload.inventory < 0 {
        return Err(AppError::Validation(
            "price and inventory must not be negative".into(),
        ));
    }

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        inventory: Set(payload.inventory),
        category_id: Set(payload.category_id),
        image_url: Set(payload.image_url),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(inventory) = payload.inventory {
        if inventory < 0 {
            return Err(AppError::Validation("inventory must not be negative".into()));
        }
        active.inventory = Set(inventory);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Admin stock correction outside the order flow.
pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::Validation("delta must not be 0".into()));
    }

    let product: Option<Product> = sqlx::query_as(
        r#"
        UPDATE products
        SET inventory = inventory + $2, updated_at = now()
        WHERE id = $1 AND inventory + $2 >= 0
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.delta)
    .fetch_optional(&state.pool)
    .await?;

    match product {
        Some(product) => Ok(ApiResponse::success(
            "Inventory updated",
            product,
            Some(Meta::empty()),
        )),
        None => {
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&state.pool)
                .await?;
            if exists.is_some() {
                Err(AppError::Validation("inventory cannot go negative".into()))
            } else {
                Err(AppError::NotFound)
            }
        }
    }
}

/// Attach review aggregates, computed from testimonial rows at query time.
async fn with_ratings(
    state: &AppState,
    products: Vec<Product>,
) -> AppResult<Vec<ProductWithRating>> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let rows: Vec<(Uuid, f64, i64)> = sqlx::query_as(
        r#"
        SELECT product_id, AVG(rating)::float8, COUNT(*)
        FROM testimonials
        WHERE product_id = ANY($1)
        GROUP BY product_id
        "#,
    )
    .bind(&ids)
    .fetch_all(&state.pool)
    .await?;

    let aggregates: HashMap<Uuid, (f64, i64)> = rows
        .into_iter()
        .map(|(id, avg, count)| (id, (avg, count)))
        .collect();

    Ok(products
        .into_iter()
        .map(|product| {
            let (avg, count) = aggregates.get(&product.id).copied().unwrap_or((0.0, 0));
            ProductWithRating {
                product,
                average_rating: (avg * 10.0).round() / 10.0,
                review_count: count,
            }
        })
        .collect())
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        inventory: model.inventory,
        category_id: model.category_id,
        image_url: model.image_url,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
