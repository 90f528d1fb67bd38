//! Business services composing the repositories.

pub mod auth;
pub mod cart;
pub mod email;
pub mod products;

pub use auth::AuthService;
pub use cart::CartService;
pub use email::EmailService;
pub use products::ProductService;
