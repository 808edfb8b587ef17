pub mod backend;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod prompt;

pub use backend::{
    api_key_from_env, resolve_backend, BackendCapability, BackendError, BackendRequest,
    GenerativeBackend, NullBackend,
};
#[cfg(feature = "gemini")]
pub use gemini::GeminiBackend;
pub use prompt::{build_prompt, parse_pattern, parse_reply, BackendReply};
