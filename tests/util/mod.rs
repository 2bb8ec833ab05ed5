pub mod capture;
pub mod cli;
