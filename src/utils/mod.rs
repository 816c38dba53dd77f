pub mod responses;
pub mod validation;

pub use responses::{redirect_with_flash, Flash, FlashCategory, HtmlTemplate};
pub use validation::{validators, ValidationErrors, ValidationResult, Validator};
