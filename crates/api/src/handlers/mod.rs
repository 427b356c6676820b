pub mod isos;
