pub mod markup_preset;
pub mod product;
pub mod sale;
pub mod user;
pub mod vendor;
