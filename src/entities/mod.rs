pub mod prelude;

pub mod transactions;
pub mod users;
