pub mod cart;
pub mod commission;
pub mod coupon;
pub mod errors;
pub mod order;
pub mod ports;
pub mod product;
pub mod seller;
