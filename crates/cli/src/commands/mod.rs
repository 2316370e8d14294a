//! `ll-cli` subcommands.

pub mod checkout;
pub mod migrate;
