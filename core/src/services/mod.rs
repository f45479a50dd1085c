//! Application services.
//!
//! Each service owns an environment of injected collaborators and holds no
//! other state, so one instance is shared behind an `Arc` for the lifetime of
//! the process.

mod exam;
mod member;
mod reservation;

pub use exam::{ExamEnvironment, ExamService};
pub use member::{MemberEnvironment, MemberService};
pub use reservation::{ReservationEnvironment, ReservationService};
