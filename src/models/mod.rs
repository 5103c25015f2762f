pub mod account;
pub mod enums;
pub mod exam;
pub mod history;
pub mod medication;
pub mod patient;
pub mod profile;
pub mod vaccine;

pub use account::*;
pub use enums::*;
pub use exam::*;
pub use history::*;
pub use medication::*;
pub use patient::*;
pub use profile::*;
pub use vaccine::*;
