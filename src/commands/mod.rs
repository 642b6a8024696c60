pub mod batch;
pub mod extract;
pub mod inventory;
pub mod status;
