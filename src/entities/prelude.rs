pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
