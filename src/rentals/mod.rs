// Rental assignment: the four-screen flow and the commits behind it

pub mod service;
pub mod state_machine;
pub mod workflow;

pub use service::{RentalDetails, RentalService};
pub use state_machine::{RentalEvent, RentalFlow, Step};
pub use workflow::{RentalWorkflow, Screen};
