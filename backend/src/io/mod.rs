//! # IO Module
//!
//! Boundary between the domain and the presentation layer. Presentation
//! code speaks the DTOs of the `shared` crate; the mappers here translate
//! them to and from domain types.

pub mod mappers;
