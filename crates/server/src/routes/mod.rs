//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (DB ping)
//!
//! # Auth (rate-limited)
//! POST /auth/register           - Create a customer account
//! POST /auth/login              - Login (optionally merges a guest cart)
//! POST /auth/logout             - Logout
//! GET  /auth/me                 - Current session user
//! POST /auth/forgot-password    - Issue a 6-digit reset code
//! POST /auth/reset-password     - Consume a code, set a new password
//! POST /auth/change-password    - Change password (authenticated)
//!
//! # Catalog (public)
//! GET  /products                - Active products with variants/images
//! GET  /products/{id}           - One active product
//! GET  /search?q=               - Case-insensitive catalog search
//! GET  /colors | /categories | /brands - Reference data
//!
//! # Cart (authenticated)
//! GET    /cart                  - Cart detail
//! POST   /cart/add              - Add (clamped to stock, reports `added`)
//! POST   /cart/sync             - Merge guest cart (max per variant)
//! PUT    /cart/items/{id}       - Set line quantity (0 removes)
//! DELETE /cart/items/{id}       - Remove line
//! DELETE /cart                  - Clear cart
//!
//! # Orders
//! POST /orders                  - Checkout (transactional)
//! POST /orders/confirm-payment  - Mark `pagado` after capture
//! GET  /my-orders               - Own order history
//!
//! # PayPal
//! POST /api/paypal/create-order  - Create Orders v2 order
//! POST /api/paypal/capture-order - Capture an approved order
//!
//! # Admin (role-gated via `RequireAdmin`)
//! GET/POST/PUT/DELETE /admin/products*  - Catalog management (multipart)
//! DELETE /admin/products/{id}/images/{image_id}
//! POST/PUT/DELETE under /colors, /categories, /brands; /suppliers CRUD
//! GET  /admin/users*            - User management
//! GET  /admin/orders*           - Order management + status updates
//! GET  /admin/reports/*         - Dashboards
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod paypal;
pub mod products;
pub mod reports;
pub mod search;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router (rate-limited).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/change-password", post(auth::change_password))
        .layer(auth_rate_limiter())
}

/// Create the public catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/search", get(search::search))
        .route("/colors", get(catalog::list_colors).post(catalog::create_color))
        .route(
            "/colors/{id}",
            put(catalog::update_color).delete(catalog::delete_color),
        )
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/categories/{id}",
            put(catalog::update_category).delete(catalog::delete_category),
        )
        .route("/brands", get(catalog::list_brands).post(catalog::create_brand))
        .route(
            "/brands/{id}",
            put(catalog::update_brand).delete(catalog::delete_brand),
        )
        .route(
            "/suppliers",
            get(catalog::list_suppliers).post(catalog::create_supplier),
        )
        .route(
            "/suppliers/{id}",
            put(catalog::update_supplier).delete(catalog::delete_supplier),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/add", post(cart::add))
        .route("/sync", post(cart::sync))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(orders::create))
        .route("/orders/confirm-payment", post(orders::confirm_payment))
        .route("/my-orders", get(orders::my_orders))
}

/// Create the PayPal API routes router.
pub fn paypal_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(paypal::create_order))
        .route("/capture-order", post(paypal::capture_order))
}

/// Create the admin routes router.
///
/// Authorization happens per-handler through the `RequireAdmin` extractor.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // Products
        .route(
            "/products",
            get(products::admin_index).post(products::create),
        )
        .route(
            "/products/{id}",
            put(products::update).delete(products::remove),
        )
        .route(
            "/products/{id}/images/{image_id}",
            delete(products::remove_image),
        )
        // Users
        .route("/users", get(users::index))
        .route(
            "/users/{id}",
            get(users::show).put(users::update).delete(users::remove),
        )
        // Orders
        .route("/orders", get(orders::admin_index))
        .route("/orders/{id}", get(orders::admin_show))
        .route("/orders/{id}/status", put(orders::admin_update_status))
        // Reports
        .route("/reports/dashboard", get(reports::dashboard))
        .route("/reports/top-products", get(reports::top_products))
        .route("/reports/sales-by-period", get(reports::sales_by_period))
        .route("/reports/sales-by-region", get(reports::sales_by_region))
        .route("/reports/low-stock", get(reports::low_stock))
        .route("/reports/orders-by-status", get(reports::orders_by_status))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(order_routes())
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
        .nest("/api/paypal", paypal_routes())
        .nest("/admin", admin_routes())
}
