mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{BlockValidator, Validator};
