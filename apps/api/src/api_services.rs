mod chat_backend;
mod state_builder;

pub use chat_backend::build_ollama_backend;
pub use state_builder::build_app_state;
