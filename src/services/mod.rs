pub mod address_service;
pub mod assets;
pub mod auth_service;
pub mod banner_service;
pub mod order_service;
pub mod product_service;
pub mod session;
pub mod webhook;
