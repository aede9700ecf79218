pub mod aux;
pub mod fetch;
