pub mod checkout;
pub mod gallery;
