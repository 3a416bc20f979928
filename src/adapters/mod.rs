// Adapters layer: concrete implementations of the domain ports.

pub mod openai;

pub use openai::OpenAiClient;
