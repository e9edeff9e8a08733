mod hackathon;
mod result;
pub mod schedule;
mod team;

pub use hackathon::HackathonConfig;
pub use result::{Error, Result};
pub use schedule::Schedule;
pub use team::{Roster, Team};
