pub mod gateway;

pub use gateway::{ChatGateway, ChatRequest, GatewayError, HttpChatGateway};
