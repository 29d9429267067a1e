pub mod availability;
pub mod locks;

pub use availability::AvailabilityResolver;
pub use locks::ProfessionalLocks;
