pub mod addresses;
pub mod auth;
pub mod banners;
pub mod orders;
pub mod products;
