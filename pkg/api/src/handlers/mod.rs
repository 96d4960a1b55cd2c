pub mod events;
pub mod secrets;
pub mod vaults;
