pub mod device;
pub mod enums;
pub mod generic;
pub mod peripheral;
pub mod register;
