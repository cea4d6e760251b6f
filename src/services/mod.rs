pub mod code_service;
pub mod code_service_impl;
pub use code_service::{CodeError, CodeService, REDEEMED_MESSAGE};
pub use code_service_impl::SeaOrmCodeService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;

pub mod qr;
pub use qr::{QrError, QrService};

pub mod provisioning;
pub use provisioning::provision_admin;
