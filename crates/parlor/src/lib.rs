pub mod errors;
pub mod models;
pub mod normalize;
pub mod remote;
pub mod reply;
pub mod session;
