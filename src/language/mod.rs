//! Synchronous language analysis, question answering, conversation understanding, and the closed
//! option sets of the tools.

pub mod client;
pub mod options;
pub mod types;

pub use client::{LanguageClient, LanguageSettings, ProjectDeployment};
pub use types::{
    AnalyzeTextRequest, KnowledgeBaseQuery, LanguageError, RankerKind, TextDocument, TextJobRequest,
    TextTask,
};
