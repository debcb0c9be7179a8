pub mod customer;
pub mod distribution;
pub mod order;
