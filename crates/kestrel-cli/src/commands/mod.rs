pub mod build;
pub mod check;
pub mod dump;
pub mod exec;
pub mod program_loader;
pub mod trace;

#[cfg(test)]
mod program_loader_tests;
#[cfg(test)]
mod exec_tests;
