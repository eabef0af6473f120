//! SVD document decoding and the hardware model built from it

pub mod access;
pub mod builder;
pub mod model;
pub mod tree;

pub use access::{Access, StorageWidth, U32Ext};
pub use builder::ModelBuilder;
pub use model::{Device, Enumerant, Field, Instance, Layout, Peripheral, Register, RegisterBlock};
