pub mod cli;
pub mod codegen;
pub mod compile;
pub mod guard;
pub mod names;
pub mod schema;
