use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::AddressList,
        cart::{CartLine, CartLineProduct, CartWithTotals},
        notifications::{NotificationList, SendNotificationResponse, UnreadCount},
        orders::{OrderList, OrderStats, OrderWithItems},
        products::{
            AdminProductList, CategoryList, ProductList, ProductWithRating, RankedProduct,
            SearchResults, SuggestionList,
        },
        reviews::{ReviewList, ReviewWithAuthor},
        wishlist::{WishlistItem, WishlistItems, WishlistMembership},
    },
    models::{
        Address, Banner, Cart, CartItem, Category, Notification, Order, OrderItem, Product,
        Profile, Testimonial, User, WishlistEntry,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses, admin, auth, banners, cart, health, notifications, orders, params, products,
        profile, reviews, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::similar_products,
        products::search_products,
        products::search_suggestions,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::adjust_inventory,
        products::list_categories,
        products::get_category,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        orders::create_order,
        orders::list_orders,
        orders::order_stats,
        orders::get_order,
        orders::cancel_order,
        orders::reorder,
        addresses::list_addresses,
        addresses::get_address,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address,
        addresses::set_default_address,
        profile::get_profile,
        profile::update_profile,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::toggle_wishlist,
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        notifications::send_notification,
        reviews::list_for_product,
        reviews::create_review,
        reviews::update_review,
        reviews::delete_review,
        banners::list_banners,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock
    ),
    components(
        schemas(
            User,
            Product,
            Category,
            Address,
            Cart,
            CartItem,
            Order,
            OrderItem,
            WishlistEntry,
            Testimonial,
            Banner,
            Notification,
            Profile,
            ProductWithRating,
            RankedProduct,
            ProductList,
            AdminProductList,
            SearchResults,
            SuggestionList,
            CategoryList,
            CartLine,
            CartLineProduct,
            CartWithTotals,
            OrderWithItems,
            OrderList,
            OrderStats,
            AddressList,
            WishlistItem,
            WishlistItems,
            WishlistMembership,
            NotificationList,
            UnreadCount,
            SendNotificationResponse,
            ReviewWithAuthor,
            ReviewList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::NotificationQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartWithTotals>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<SearchResults>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Addresses", description = "Address book endpoints"),
        (name = "Profile", description = "Profile endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Notifications", description = "Notification endpoints"),
        (name = "Reviews", description = "Review endpoints"),
        (name = "Banners", description = "Storefront banner endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
