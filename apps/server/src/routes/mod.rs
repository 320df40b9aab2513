//! Route modules, one per resource.

pub mod cash;
pub mod products;
pub mod sales;
