pub mod opportunity;
pub mod price;
