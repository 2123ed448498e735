pub mod assembly;
pub mod ast;
pub mod compiler;
pub mod driver;
pub mod error;
pub mod output;
pub mod parser;
