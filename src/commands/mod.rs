pub mod harvest;
pub mod status;
