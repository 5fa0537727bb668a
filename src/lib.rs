//! Translator from the stack-based VM language to Hack assembly.
//!
//! - `parser` classifies source lines into [`Command`]s.
//! - `translator` lowers commands into assembly, owning the label counter and
//!   the current unit/function scope.
//! - `driver` handles files, directories and the bootstrap policy.

pub mod ast;
pub mod driver;
pub mod error;
pub mod labels;
pub mod parser;
pub mod translator;

pub use ast::{ArithmeticOp, Command, CommandKind, Segment};
pub use driver::{translate_path, translate_sources, BootstrapPolicy, DriverOptions};
pub use error::{Result, TranslateError};
pub use labels::LabelAllocator;
pub use translator::{Translator, TranslatorConfig};
