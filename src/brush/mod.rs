pub mod stroke;
pub mod surface;
