pub mod activity;
pub mod base;
pub mod enrollment;
pub mod session;
pub mod team;
pub mod user;
pub mod workshop;

pub use activity::ActivityDao;
pub use base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};
pub use enrollment::EnrollmentDao;
pub use session::SessionDao;
pub use team::TeamDao;
pub use user::UserDao;
pub use workshop::WorkshopDao;
