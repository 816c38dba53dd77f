pub mod certificates;
pub mod health;
pub mod pages;

pub use certificates::generate_cert;
pub use health::health_check_handler;
pub use pages::{index, login_page, login_submit, logout};
