//! Data models for calculator service payloads.
//!
//! - `Calculation`, `CalculationType`: stored calculations and the operations
//!   the service supports, including a local evaluator for previews
//! - Auth types: `RegisterRequest`, `LoginRequest`, `TokenResponse`, `UserResponse`
//! - Report types: `UserStatistics`, `HistoryPage`, `OperationStatistics`

pub mod calculation;
pub mod stats;
pub mod user;

pub use calculation::{Calculation, CalculationType, CalculationUpdate, NewCalculation};
pub use stats::{HistoryPage, OperationStatistics, UserStatistics};
pub use user::{HealthStatus, LoginRequest, RegisterRequest, TokenResponse, UserResponse};
