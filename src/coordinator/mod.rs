pub mod dispatcher;
pub mod status;

pub use dispatcher::Dispatcher;
pub use status::StatusQuery;
