mod deposit;
mod mineral;
mod user;

pub use deposit::Deposit;
pub use mineral::{MineralPatch, MineralRecord};
pub use user::{User, UserView};
