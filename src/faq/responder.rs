//! Keyword scoring and reply formatting.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::knowledge::{KnowledgeBase, KnowledgeEntry, Localized};
use super::normalize::normalize;

/// Points per matched keyword.
pub const KEYWORD_WEIGHT: u32 = 10;

/// Reply language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// `pt`, the default.
    #[default]
    Portuguese,
    /// Any code starting with `en`.
    English,
}

impl Language {
    /// Resolve a language code; anything that does not start with `en`
    /// (case-insensitive) is Portuguese.
    #[must_use]
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(code) if code.trim().to_ascii_lowercase().starts_with("en") => Self::English,
            _ => Self::Portuguese,
        }
    }

    /// Short code, `"pt"` or `"en"`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Portuguese => "pt",
            Self::English => "en",
        }
    }
}

/// A question as submitted by the portal UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqRequest {
    /// Primary question text.
    pub message: Option<String>,
    /// Used when `message` is missing or blank.
    pub prompt: Option<String>,
    /// Language code such as `"pt"` or `"en-US"`.
    pub language: Option<String>,
}

impl FaqRequest {
    /// Request with `message` set.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Request with only `prompt` set.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    /// Set the language code.
    #[must_use]
    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }

    /// The question text: `message` when non-blank, else `prompt`, else "".
    #[must_use]
    pub fn question(&self) -> &str {
        [self.message.as_deref(), self.prompt.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
            .unwrap_or("")
    }

    /// Resolved reply language.
    #[must_use]
    pub fn resolved_language(&self) -> Language {
        Language::from_code(self.language.as_deref())
    }
}

/// Best-scoring entry for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredMatch<'a> {
    /// The winning entry.
    pub entry: &'a KnowledgeEntry,
    /// Its score; always above zero.
    pub score: u32,
}

struct Messages {
    empty: Localized,
    fallback: Localized,
    header: Localized,
    suggestions: Vec<Localized>,
}

fn messages() -> &'static Messages {
    static MESSAGES: OnceLock<Messages> = OnceLock::new();
    MESSAGES.get_or_init(|| Messages {
        empty: Localized::new(
            "Por favor, digite a sua pergunta para que eu possa ajudar.",
            "Please type your question so I can help.",
        ),
        fallback: Localized::new(
            "Desculpe, não encontrei uma resposta para a sua pergunta. Tente reformular ou escolha um dos temas abaixo.",
            "Sorry, I couldn't find an answer to your question. Try rephrasing it or pick one of the topics below.",
        ),
        header: Localized::new("Você também pode perguntar:", "You can also ask:"),
        suggestions: vec![
            Localized::new("Qual é o horário do almoço?", "When is lunch?"),
            Localized::new("Quando a bolsa-auxílio é paga?", "When is the stipend paid?"),
            Localized::new("Como falo com meu padrinho?", "How do I reach my mentor?"),
            Localized::new("Como funcionam as férias?", "How does time off work?"),
        ],
    })
}

/// Answers questions from a [`KnowledgeBase`].
#[derive(Debug, Clone, Default)]
pub struct FaqResponder {
    knowledge: KnowledgeBase,
}

impl FaqResponder {
    /// Responder over `knowledge`.
    #[must_use]
    pub fn new(knowledge: KnowledgeBase) -> Self {
        Self { knowledge }
    }

    /// The knowledge base in use.
    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Answer a portal request.
    #[must_use]
    pub fn respond(&self, request: &FaqRequest) -> String {
        self.answer(request.question(), request.resolved_language())
    }

    /// Answer `question` in `language`.
    #[must_use]
    pub fn answer(&self, question: &str, language: Language) -> String {
        let text = messages();
        if question.trim().is_empty() {
            return text.empty.get(language).to_string();
        }

        match self.best_match(question) {
            Some(found) => {
                debug!(entry = %found.entry.id, score = found.score, "faq match");
                let follow_ups: Vec<&str> =
                    found.entry.follow_ups.iter().map(|f| f.get(language)).collect();
                format_reply(
                    found.entry.answer.get(language),
                    text.header.get(language),
                    &follow_ups,
                )
            }
            None => {
                debug!(lang = language.code(), "faq fallback");
                let suggestions: Vec<&str> =
                    text.suggestions.iter().map(|s| s.get(language)).collect();
                format_reply(
                    text.fallback.get(language),
                    text.header.get(language),
                    &suggestions,
                )
            }
        }
    }

    /// Highest-scoring entry, or `None` when nothing matched. Earlier
    /// entries win ties.
    #[must_use]
    pub fn best_match(&self, question: &str) -> Option<ScoredMatch<'_>> {
        let normalized = normalize(question);
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<ScoredMatch<'_>> = None;
        for prepared in self.knowledge.prepared() {
            let matched = prepared.matches(&normalized);
            if matched == 0 {
                continue;
            }
            let matched = u32::try_from(matched).unwrap_or(u32::MAX);
            let score = matched
                .saturating_mul(KEYWORD_WEIGHT)
                .saturating_add(prepared.entry.priority);
            if best.map_or(true, |b| score > b.score) {
                best = Some(ScoredMatch {
                    entry: &prepared.entry,
                    score,
                });
            }
        }
        best
    }
}

fn format_reply(body: &str, header: &str, suggestions: &[&str]) -> String {
    if suggestions.is_empty() {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len() + header.len() + 64);
    out.push_str(body);
    out.push_str("\n\n");
    out.push_str(header);
    for suggestion in suggestions {
        out.push_str("\n• ");
        out.push_str(suggestion);
    }
    out
}

/// Answer `request` with the built-in knowledge base.
#[must_use]
pub fn respond(request: &FaqRequest) -> String {
    static BUILTIN: OnceLock<FaqResponder> = OnceLock::new();
    BUILTIN.get_or_init(FaqResponder::default).respond(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faq::KnowledgeEntry;

    fn entry(id: &str, priority: u32, keywords: &[&str]) -> KnowledgeEntry {
        KnowledgeEntry {
            id: id.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            patterns: vec![],
            priority,
            answer: Localized::new(format!("{id}-pt"), format!("{id}-en")),
            follow_ups: vec![],
        }
    }

    fn responder(entries: Vec<KnowledgeEntry>) -> FaqResponder {
        FaqResponder::new(KnowledgeBase::new(entries).unwrap())
    }

    #[test]
    fn test_language_from_code() {
        assert_eq!(Language::from_code(None), Language::Portuguese);
        assert_eq!(Language::from_code(Some("pt-BR")), Language::Portuguese);
        assert_eq!(Language::from_code(Some("en")), Language::English);
        assert_eq!(Language::from_code(Some("  EN-us ")), Language::English);
        assert_eq!(Language::from_code(Some("es")), Language::Portuguese);
    }

    #[test]
    fn test_question_prefers_non_blank_message() {
        let mut request = FaqRequest::prompt("from prompt");
        assert_eq!(request.question(), "from prompt");
        request.message = Some("   ".into());
        assert_eq!(request.question(), "from prompt");
        request.message = Some("from message".into());
        assert_eq!(request.question(), "from message");
        assert_eq!(FaqRequest::default().question(), "");
    }

    #[test]
    fn test_score_counts_keywords_and_priority() {
        let r = responder(vec![entry("a", 5, &["lunch", "time"])]);
        let found = r.best_match("Lunch time?").unwrap();
        assert_eq!(found.score, 2 * KEYWORD_WEIGHT + 5);
    }

    #[test]
    fn test_priority_alone_never_matches() {
        let r = responder(vec![entry("a", 100, &["lunch"])]);
        assert!(r.best_match("parking").is_none());
    }

    #[test]
    fn test_tie_goes_to_first_entry() {
        let r = responder(vec![entry("first", 0, &["badge"]), entry("second", 0, &["badge"])]);
        assert_eq!(r.best_match("badge").unwrap().entry.id, "first");
    }

    #[test]
    fn test_priority_breaks_keyword_tie() {
        let r = responder(vec![entry("low", 0, &["badge"]), entry("high", 3, &["badge"])]);
        assert_eq!(r.best_match("badge").unwrap().entry.id, "high");
    }

    #[test]
    fn test_reply_without_follow_ups_is_bare_answer() {
        let r = responder(vec![entry("a", 0, &["badge"])]);
        assert_eq!(r.answer("badge", Language::English), "a-en");
    }

    #[test]
    fn test_format_reply_lists_suggestions() {
        let out = format_reply("Body", "Header:", &["one", "two"]);
        assert_eq!(out, "Body\n\nHeader:\n• one\n• two");
    }

    #[test]
    fn test_punctuation_only_question_falls_back() {
        let r = FaqResponder::default();
        let out = r.answer("?!?", Language::Portuguese);
        assert!(out.starts_with(messages().fallback.pt.as_str()));
    }
}
