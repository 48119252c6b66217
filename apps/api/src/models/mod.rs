pub mod language;
pub mod pack;
pub mod request;
