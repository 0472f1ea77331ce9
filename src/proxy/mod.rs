mod handler;
mod server;

pub use handler::*;
pub use server::*;
