pub mod beautify;
pub mod build;
pub mod clean;
pub mod doxygen;
pub mod flash;
pub mod lint;
pub mod map;
pub mod pytest;
pub mod size;
pub mod toolchain;
