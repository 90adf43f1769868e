pub mod patterns;
pub mod sanitizer;
pub mod validator;

pub use sanitizer::{Sanitizer, SanitizerConfig};
pub use validator::{Validator, ValidatorConfig};
pub use vigil_model::ValidationVerdict;
