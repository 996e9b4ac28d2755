pub mod inspect;
pub mod plan;
