pub mod arithmetic;
pub mod conversions;
pub mod equality;
