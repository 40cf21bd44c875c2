pub mod accounts;
pub mod events;
pub mod fraud;
pub mod sessions;
pub mod transactions;
