//! Third-party API clients
//!
//! Chat completions (OpenAI, Perplexity) and Google Books.

pub mod books;
pub mod chat;

pub use books::{BookInfo, BookQuery, BooksClient};
pub use chat::{ChatClient, ChatMessage, CompletionOptions};
