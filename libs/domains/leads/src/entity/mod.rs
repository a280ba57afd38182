pub mod campaign;
pub mod lead;
