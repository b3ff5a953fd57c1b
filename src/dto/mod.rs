pub mod addresses;
pub mod auth;
pub mod cart;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod wishlist;
