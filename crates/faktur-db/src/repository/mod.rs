//! # Repository Layer
//!
//! One repository per entity. Every repository owns a pool clone and exposes
//! async operations; the invoice repository additionally owns the two
//! multi-statement transactions (create, update-with-item-diff).

pub mod customer;
pub mod invoice;
pub mod product;
pub mod token;
pub mod user;
