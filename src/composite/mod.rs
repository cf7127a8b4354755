pub mod masked;
