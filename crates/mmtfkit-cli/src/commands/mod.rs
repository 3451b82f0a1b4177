pub mod convert;
pub mod inspect;
pub mod interactions;
pub mod segments;
