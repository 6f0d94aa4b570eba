//! pyrepr: generate `__repr__` methods for Python classes.
//!
//! Given a Python module, pyrepr derives a `__repr__` method for each class
//! from the class's `__init__` signature and either previews, diffs, or
//! rewrites the module file to insert those methods.
//!
//! The pipeline is static: the module is read as text, classes and their
//! constructors are located syntactically, and the parameter list is parsed
//! straight from the source. Nothing is imported or executed.

pub mod classes;
pub mod diff;
pub mod driver;
pub mod error;
pub mod module;
pub mod output;
pub mod signature;
pub mod synth;
