pub mod access;
pub mod loans;
