pub mod setup;
pub mod summary;
pub mod ui;
pub mod wallets;
pub mod watch;
