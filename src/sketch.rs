/// points, circles and arcs; the equations an entity writes by itself
pub mod entities;
/// geometric constraints and the equations they write
pub mod constraints;
/// the document: tables, builders and the `ConstraintLayer` implementation
pub mod sketch_document;
#[cfg(test)]
mod sketch_tests;
