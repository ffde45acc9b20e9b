pub mod entity;
pub mod filter;
pub mod repository;
pub mod value_object;
