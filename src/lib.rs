// lib.rs
pub mod gfa;
pub mod graph;
pub mod index;
pub mod refs;
pub mod split;
