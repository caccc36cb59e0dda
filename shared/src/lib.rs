pub mod error;
pub mod models;
pub mod validation;
pub mod user_info;
pub mod tally;

pub use error::ErrorResponse;
pub use models::*;
pub use validation::*;
pub use user_info::*;
pub use tally::{epoch_millis, percentage, TallyError};
