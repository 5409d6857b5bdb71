pub mod auth;
pub mod certificate;
pub mod codegen;
pub mod dao;
pub mod locks;
pub mod notify;
pub mod ranking;
pub mod scoring;
pub mod workshop;
pub mod xp;

pub use auth::AuthService;
pub use certificate::CertificateService;
pub use codegen::CodeGenerator;
pub use dao::*;
pub use locks::LockRegistry;
pub use notify::NotificationService;
pub use workshop::WorkshopService;
pub use xp::XpService;
