pub mod booking;
pub mod reservation;
pub mod seat;

pub use booking::{Booking, BookingStatus};
pub use reservation::{Reservation, ReservationStatus};
pub use seat::{Seat, SeatStatus};
