// Public modules
pub mod message;
pub mod message_list;
pub mod request_state;
pub mod sender;

// Re-exports
pub use message::{Message, MessageStyle};
pub use message_list::{Entry, MessageList};
pub use request_state::RequestState;
pub use sender::{Sender, SenderParseError};
