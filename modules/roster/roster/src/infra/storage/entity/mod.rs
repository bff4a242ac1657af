pub mod member;
pub mod organization;
