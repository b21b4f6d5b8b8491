pub mod error;
pub mod llm;

pub use error::{ReportError, Result};
pub use llm::{
    ChatTurn, GeminiClient, GenerationRequest, GenerationResponse, InferenceClient, Source,
    TurnRole,
};
