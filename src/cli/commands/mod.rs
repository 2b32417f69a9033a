pub mod derive;
pub mod hash;
pub mod protect;
pub mod resalt;
pub mod reveal;
