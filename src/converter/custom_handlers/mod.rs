mod code_language_handler;
mod link_handler;

pub use code_language_handler::CodeLanguageHandlerFactory;
pub use link_handler::LinkHandlerFactory;
