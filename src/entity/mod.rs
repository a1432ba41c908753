pub mod addresses;
pub mod banners;
pub mod order_lines;
pub mod orders;
pub mod products;
pub mod users;

pub use addresses::Entity as Addresses;
pub use banners::Entity as Banners;
pub use order_lines::Entity as OrderLines;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use users::Entity as Users;
