// src/models/mod.rs

pub mod feedback;
pub mod payment;
pub mod user;

pub use feedback::Feedback;
pub use payment::{PaymentKind, PaymentRecord, PaymentStatus};
pub use user::{Gender, Interest, Lang, MediaType, NdTrait, User};
