//! `SeaORM` entity prelude.

pub use super::wallets::Entity as Wallets;
