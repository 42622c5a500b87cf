pub mod backup;
pub mod dashboard;
pub mod import_export;
pub mod markup_preset;
pub mod product;
pub mod sale;
pub mod upload;
pub mod user;
pub mod vendor;
