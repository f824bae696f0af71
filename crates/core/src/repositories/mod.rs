//! Record services: file-backed persistence for each record kind.

pub mod appointments;
pub(crate) mod helpers;
pub mod patients;
pub mod trackings;
pub mod visits;
