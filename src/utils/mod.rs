pub mod crypto;
pub mod logging;
pub mod url_validator;
