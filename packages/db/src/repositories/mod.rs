//! Repository implementations for database operations.

mod current_token_repo;
mod department_repo;
mod patient_repo;
mod token_repo;

pub use current_token_repo::CurrentTokenRepository;
pub use department_repo::DepartmentRepository;
pub use patient_repo::PatientRepository;
pub use token_repo::TokenRepository;
