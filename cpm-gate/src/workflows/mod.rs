//! Gate workflows: vehicle entry and checkout

pub mod checkout;
pub mod entry;

pub use checkout::CheckoutWorkflow;
pub use entry::EntryWorkflow;
