pub mod attendance;
pub use attendance::AttendanceError;

pub mod token;
pub use token::{Claims, TokenError, TokenService};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;

pub mod transaction_service;
pub mod transaction_service_impl;
pub use transaction_service::{
    BankStat, Pagination, TransactionDto, TransactionError, TransactionList, TransactionService,
    TransactionStats,
};
pub use transaction_service_impl::SeaOrmTransactionService;
