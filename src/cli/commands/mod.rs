pub mod hash;
pub mod inspect;
