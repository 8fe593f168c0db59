pub mod constants;
pub mod devsetup;
pub mod errors;
pub mod logger;
