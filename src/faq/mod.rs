//! Bilingual FAQ responder for the intern portal.
//!
//! Questions are normalized and scored against a keyword knowledge base;
//! the best entry's answer is returned with its follow-up suggestions, or a
//! fallback reply when nothing matches.
//!
//! ```
//! use portal_store::faq::{respond, FaqRequest};
//!
//! let reply = respond(&FaqRequest::message("Qual é o horário do almoço?"));
//! assert!(reply.starts_with("O almoço"));
//! ```

mod error;
mod knowledge;
mod normalize;
mod responder;

pub use error::{FaqError, FaqResult};
pub use knowledge::{KnowledgeBase, KnowledgeEntry, Localized};
pub use normalize::normalize;
pub use responder::{respond, FaqRequest, FaqResponder, Language, ScoredMatch, KEYWORD_WEIGHT};
