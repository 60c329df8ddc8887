pub mod config;
pub mod error;
pub mod history;
pub mod net;
pub mod session;

pub use config::{ApiConfig, AppConfig, CacheConfig, LoggingConfig, PipelineConfig};
pub use error::DomainError;
pub use history::{ConversationHistory, Role, Turn, CONTEXT_WINDOW, HISTORY_CAP};
pub use net::{Accept, FetchRequest, FetchResponse, Method, MultipartField, RequestBody, ServiceRejection};
pub use session::{AudioChunk, ChunkBuffer, Language, PipelineEvent, Session, SessionState};
