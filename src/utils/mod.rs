pub mod command;
pub mod dsub;
pub mod file;
pub mod genomics;
pub mod naming;
