//! Domain model: the records the API serves, the commands it accepts, and
//! the lifecycle rules of a parte.

mod records;
mod requests;
mod state;

pub use records::*;
pub use requests::*;
pub use state::*;
