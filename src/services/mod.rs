pub mod audit_service;
pub mod auth_service;
pub mod certificate_service;
pub mod scrape_service;

pub use audit_service::{AuditOutcome, AuditService};
pub use auth_service::{AuthService, AuthServiceError, LoginResponse};
pub use certificate_service::{Certificate, CertificateError, CertificateService};
pub use scrape_service::{ScrapeService, ScrapeSettings};
