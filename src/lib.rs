pub mod assembler;
pub mod build;
pub mod calendar;
pub mod client;
pub mod config;
pub mod error;
pub mod fragment;
pub mod grid;
pub mod l10n;
pub mod layout;
pub mod location;
pub mod photos;
