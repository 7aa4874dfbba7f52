//! Booking lifecycle: quoting, availability, and the
//! pending → confirmed → completed / cancelled state machine.

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{intervals_overlap, Booking, BookingId, BookingStatus, NewBooking, Quote};
pub use repository::BookingRepository;
pub use service::{BookingError, BookingRequest, BookingService};
