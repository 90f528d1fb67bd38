//! Domain models.
//!
//! These types represent validated domain objects separate from database row
//! types; repositories convert rows into them via `TryFrom`.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItem, CartItemDetail};
pub use catalog::{Brand, Category, Color, Supplier};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderItemDetail, OrderWithItems};
pub use product::{
    NewProduct, Product, ProductDetail, ProductImage, ProductVariant, SubmittedVariant,
};
pub use session::{CurrentUser, session_keys};
pub use user::{NewUser, UpdateUser, User};
