pub mod addresses;
pub mod banners;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod testimonials;
pub mod users;
pub mod wishlists;

pub use addresses::Entity as Addresses;
pub use banners::Entity as Banners;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use profiles::Entity as Profiles;
pub use testimonials::Entity as Testimonials;
pub use users::Entity as Users;
pub use wishlists::Entity as Wishlists;
