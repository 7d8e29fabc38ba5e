pub mod delivery;
pub mod patient;

pub use delivery::{Delivery, DeliveryStatus, DeliveryUpdate, NewDelivery};
pub use patient::{NewPatient, Patient};
