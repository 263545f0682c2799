//! The FAQ knowledge base: keyword sets, localized answers and the
//! built-in entries the portal ships with.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::{FaqError, FaqResult};
use super::normalize::normalize;
use super::responder::Language;

/// A string in both supported languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized {
    /// Portuguese text.
    pub pt: String,
    /// English text.
    pub en: String,
}

impl Localized {
    /// Build from a Portuguese/English pair.
    pub fn new(pt: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            pt: pt.into(),
            en: en.into(),
        }
    }

    /// The text for `language`.
    #[must_use]
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Portuguese => &self.pt,
            Language::English => &self.en,
        }
    }
}

/// One FAQ topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Stable identifier, e.g. `"lunch"`.
    pub id: String,
    /// Keywords in any language; matched after normalization.
    pub keywords: Vec<String>,
    /// Optional regular expressions run against the normalized question.
    /// Each one that matches counts like a keyword.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,
    /// Bonus added to the score once at least one keyword matched.
    #[serde(default)]
    pub priority: u32,
    /// The answer body.
    pub answer: Localized,
    /// Suggested follow-up questions.
    #[serde(default)]
    pub follow_ups: Vec<Localized>,
}

#[derive(Debug, Clone)]
pub(crate) struct PreparedEntry {
    pub(crate) entry: KnowledgeEntry,
    pub(crate) keywords: Vec<String>,
    pub(crate) patterns: Vec<Regex>,
}

impl PreparedEntry {
    fn prepare(entry: KnowledgeEntry) -> FaqResult<Self> {
        let keywords = prepare_keywords(&entry.keywords);
        let patterns = entry
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| FaqError::InvalidPattern {
                    id: entry.id.clone(),
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<FaqResult<Vec<_>>>()?;
        if keywords.is_empty() && patterns.is_empty() {
            return Err(FaqError::EmptyKeywords { id: entry.id });
        }
        Ok(Self {
            entry,
            keywords,
            patterns,
        })
    }

    /// Number of keywords contained in, plus patterns matching, the
    /// normalized `question`.
    pub(crate) fn matches(&self, question: &str) -> usize {
        let keywords = self
            .keywords
            .iter()
            .filter(|k| question.contains(k.as_str()))
            .count();
        let patterns = self.patterns.iter().filter(|r| r.is_match(question)).count();
        keywords + patterns
    }
}

/// Ordered FAQ entries with their keywords pre-normalized.
///
/// Entry order matters: when two entries score the same, the earlier one
/// wins.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<PreparedEntry>,
}

impl KnowledgeBase {
    /// Build from entries, rejecting invalid patterns and any entry with
    /// nothing to match on (every keyword normalizes to nothing and no
    /// pattern is given).
    pub fn new(entries: Vec<KnowledgeEntry>) -> FaqResult<Self> {
        let entries = entries
            .into_iter()
            .map(PreparedEntry::prepare)
            .collect::<FaqResult<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Parse a JSON array of [`KnowledgeEntry`].
    pub fn from_json(json: &str) -> FaqResult<Self> {
        let entries: Vec<KnowledgeEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// The entries the portal ships with.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = builtin_entries()
            .into_iter()
            .map(|entry| PreparedEntry {
                keywords: prepare_keywords(&entry.keywords),
                patterns: Vec::new(),
                entry,
            })
            .collect();
        Self { entries }
    }

    /// Entries in stored order.
    pub fn entries(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.iter().map(|p| &p.entry)
    }

    /// Entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&KnowledgeEntry> {
        self.entries().find(|e| e.id == id)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the base has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn prepared(&self) -> &[PreparedEntry] {
        &self.entries
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

fn prepare_keywords(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for keyword in raw {
        let normalized = normalize(keyword);
        if !normalized.is_empty() && !out.contains(&normalized) {
            out.push(normalized);
        }
    }
    out
}

fn entry(
    id: &str,
    priority: u32,
    keywords: &[&str],
    answer: (&str, &str),
    follow_ups: &[(&str, &str)],
) -> KnowledgeEntry {
    KnowledgeEntry {
        id: id.to_string(),
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        patterns: Vec::new(),
        priority,
        answer: Localized::new(answer.0, answer.1),
        follow_ups: follow_ups
            .iter()
            .map(|(pt, en)| Localized::new(*pt, *en))
            .collect(),
    }
}

fn builtin_entries() -> Vec<KnowledgeEntry> {
    vec![
        entry(
            "lunch",
            2,
            &[
                "almoço",
                "horário",
                "refeição",
                "refeitório",
                "restaurante",
                "lunch",
                "meal",
                "cafeteria",
            ],
            (
                "O almoço é servido no refeitório do térreo das 11h30 às 14h. Cada estagiário tem 1 hora de intervalo, combinada com o seu gestor. Quem preferir comer fora recebe o vale-refeição creditado todo dia 5.",
                "Lunch is served in the ground-floor cafeteria from 11:30 to 14:00. Every intern has a one-hour break agreed with their manager. If you prefer to eat out, the meal allowance is credited on the 5th of each month.",
            ),
            &[
                ("Como funciona o vale-refeição?", "How does the meal allowance work?"),
                ("Qual é a jornada de estágio?", "What are the working hours?"),
            ],
        ),
        entry(
            "schedule",
            1,
            &[
                "horário",
                "expediente",
                "jornada",
                "carga horária",
                "entrada",
                "saída",
                "registro de ponto",
                "schedule",
                "working hours",
                "shift",
                "clock in",
            ],
            (
                "A jornada de estágio é de 6 horas diárias (30 horas semanais), normalmente das 9h às 16h com 1 hora de almoço. O registro de ponto é feito pelo aplicativo do portal.",
                "Internships run 6 hours a day (30 hours a week), usually from 9:00 to 16:00 with a one-hour lunch break. Clock in and out through the portal app.",
            ),
            &[
                ("Posso compensar horas?", "Can I make up hours?"),
                ("Qual é o horário do almoço?", "When is lunch?"),
            ],
        ),
        entry(
            "stipend",
            2,
            &[
                "bolsa",
                "pagamento",
                "salário",
                "remuneração",
                "holerite",
                "auxílio-transporte",
                "stipend",
                "salary",
                "payment",
                "paycheck",
            ],
            (
                "A bolsa-auxílio é paga até o 5º dia útil de cada mês, junto com o auxílio-transporte. O demonstrativo fica disponível na seção Documentos do portal.",
                "The stipend is paid by the 5th business day of each month, together with the transport allowance. Pay statements are available under Documents in the portal.",
            ),
            &[("Quando recebo o vale-refeição?", "When is the meal allowance credited?")],
        ),
        entry(
            "vacation",
            1,
            &[
                "férias",
                "recesso",
                "folga",
                "feriado",
                "vacation",
                "holiday",
                "time off",
                "day off",
            ],
            (
                "Estagiários têm direito a 30 dias de recesso remunerado a cada 12 meses, que podem ser divididos em até três períodos. Solicite pelo portal com pelo menos 15 dias de antecedência.",
                "Interns are entitled to 30 days of paid leave every 12 months, which can be split into up to three periods. Request it through the portal at least 15 days in advance.",
            ),
            &[("Como solicito o recesso?", "How do I request time off?")],
        ),
        entry(
            "mentor",
            3,
            &[
                "padrinho",
                "madrinha",
                "apadrinhamento",
                "mentor",
                "godparent",
                "godfather",
                "godmother",
            ],
            (
                "Todo estagiário tem um padrinho ou madrinha, um profissional experiente que acompanha o seu desenvolvimento. Os encontros são quinzenais e o contato aparece na página Meu Padrinho.",
                "Every intern has a mentor, an experienced professional who follows their development. Meetings happen every two weeks and the contact details are on the My Mentor page.",
            ),
            &[
                ("Posso trocar de padrinho?", "Can I change mentors?"),
                ("Como agendo um encontro?", "How do I schedule a meeting?"),
            ],
        ),
        entry(
            "badge",
            1,
            &["crachá", "catraca", "cartão de acesso", "badge", "access card", "turnstile"],
            (
                "O crachá é entregue no primeiro dia pela equipe de Facilities. Em caso de perda, abra um chamado no portal para emitir a segunda via.",
                "Your badge is handed out on your first day by the Facilities team. If you lose it, open a ticket in the portal to get a replacement.",
            ),
            &[],
        ),
        entry(
            "dress_code",
            1,
            &[
                "roupa",
                "vestimenta",
                "traje",
                "uniforme",
                "dress code",
                "clothes",
                "attire",
                "wear",
            ],
            (
                "Não há uniforme. O código de vestimenta é casual, e em reuniões com clientes recomendamos traje social.",
                "There is no uniform. The dress code is casual, and business attire is recommended for client meetings.",
            ),
            &[],
        ),
        entry(
            "wifi",
            1,
            &["wi-fi", "wifi", "internet", "rede sem fio", "senha da rede", "wireless", "network"],
            (
                "Conecte-se à rede Portal-Estagio usando o seu e-mail corporativo e a senha do portal. Visitantes usam a rede Portal-Guest.",
                "Connect to the Portal-Estagio network with your corporate e-mail and portal password. Guests use the Portal-Guest network.",
            ),
            &[],
        ),
        entry(
            "forum",
            1,
            &["fórum", "tópico", "discussão", "postar", "topic", "thread"],
            (
                "No Fórum você encontra as categorias Dúvidas Gerais, Projetos, Carreira e Eventos. Para abrir um tópico, escolha a categoria e clique em Novo Tópico.",
                "The Forum has the General Questions, Projects, Career and Events categories. To start a topic, pick a category and click New Topic.",
            ),
            &[("Como respondo a um tópico?", "How do I reply to a topic?")],
        ),
        entry(
            "feedback",
            1,
            &[
                "feedback",
                "avaliação",
                "opinião",
                "sugestão",
                "reclamação",
                "review",
                "suggestion",
                "complaint",
            ],
            (
                "Você pode enviar feedback a qualquer momento pela página Feedback, dando uma nota de 1 a 5 e um comentário. As avaliações de desempenho acontecem ao fim de cada trimestre.",
                "You can send feedback at any time from the Feedback page, with a rating from 1 to 5 and a comment. Performance reviews happen at the end of each quarter.",
            ),
            &[],
        ),
        entry(
            "duration",
            1,
            &[
                "duração",
                "contrato",
                "renovação",
                "efetivação",
                "tempo de estágio",
                "duration",
                "contract",
                "renewal",
                "hired",
            ],
            (
                "O contrato de estágio vale por 12 meses e pode ser renovado até o limite de 2 anos previsto na Lei do Estágio. Oportunidades de efetivação são divulgadas no portal.",
                "The internship contract lasts 12 months and can be renewed up to the two-year legal limit. Full-time openings are announced in the portal.",
            ),
            &[],
        ),
        entry(
            "contact",
            0,
            &[
                "contato",
                "recursos humanos",
                "falar com",
                "ajuda",
                "suporte",
                "contact",
                "human resources",
                "help",
                "support",
            ],
            (
                "Fale com a equipe do Programa de Estágio pelo e-mail estagio@portal.local ou pelo ramal 2040, de segunda a sexta, das 9h às 18h.",
                "Reach the Internship Program team at estagio@portal.local or extension 2040, Monday to Friday, 9:00 to 18:00.",
            ),
            &[],
        ),
    ]
}
