pub mod broadcaster;
pub mod connection;
pub mod dispatcher;
pub mod publisher;
pub mod pusher;

pub use broadcaster::Broadcaster;
pub use dispatcher::Dispatcher;
pub use publisher::Publisher;
