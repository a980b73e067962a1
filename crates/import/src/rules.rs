use finflow_core::OTHER_CATEGORY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One classification rule: if any keyword occurs in the lower-cased
/// description, the transaction belongs to `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(category: &str, keywords: &[&str]) -> Self {
        KeywordRule {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Rule for '{0}' has an empty keyword")]
    EmptyKeyword(String),
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    rule: Vec<KeywordRule>,
}

/// Rules in priority order. Earlier rules win when keywords overlap, so the
/// order of this table is part of its meaning.
const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "food",
        &[
            "mercado", "supermercado", "ifood", "restaurante", "padaria", "lanchonete", "açougue",
            "hortifruti", "pizza", "burger", "mcdonald", "subway", "starbucks", "café", "aliment",
        ],
    ),
    (
        "transport",
        &[
            "uber", "99", "cabify", "combustível", "gasolina", "etanol", "estacionamento",
            "pedágio", "ônibus", "metrô", "passagem", "shell", "ipiranga", "br distribuidora",
        ],
    ),
    (
        "housing",
        &[
            "aluguel", "condomínio", "iptu", "imobiliária", "reforma", "mudança", "mobília",
        ],
    ),
    (
        "health",
        &[
            "farmácia", "hospital", "médico", "dentista", "plano de saúde", "unimed", "amil",
            "consulta", "exame", "laboratório", "drogaria",
        ],
    ),
    (
        "education",
        &[
            "curso", "escola", "faculdade", "udemy", "coursera", "livro", "papelaria",
            "mensalidade",
        ],
    ),
    (
        "leisure",
        &[
            "netflix", "spotify", "cinema", "teatro", "show", "jogo", "game", "steam",
            "playstation", "xbox", "bar", "festa", "viagem", "hotel",
        ],
    ),
    (
        "clothing",
        &[
            "roupa", "renner", "c&a", "zara", "riachuelo", "calçado", "tênis", "nike", "adidas",
            "havan",
        ],
    ),
    (
        "services",
        &[
            "energia", "água", "gás", "internet", "celular", "telefone", "vivo", "claro", "tim",
            "cemig", "caesb", "sabesp", "luz", "conta de",
        ],
    ),
    (
        "investments",
        &[
            "investimento", "tesouro", "ação", "fundo", "cdb", "lci", "lca", "poupança",
            "bitcoin", "cripto", "renda fixa",
        ],
    ),
];

/// Keyword classifier. The first rule with a keyword contained in the
/// description wins; no match yields [`OTHER_CATEGORY`].
#[derive(Debug, Clone)]
pub struct Categorizer {
    rules: Vec<KeywordRule>,
}

impl Default for Categorizer {
    fn default() -> Self {
        Categorizer::new(
            DEFAULT_RULES
                .iter()
                .map(|(category, keywords)| KeywordRule::new(category, keywords))
                .collect(),
        )
    }
}

impl Categorizer {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| KeywordRule {
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
                ..rule
            })
            .collect();
        Self { rules }
    }

    /// Loads a rule table from `[[rule]]` entries, preserving file order.
    pub fn from_toml(toml_content: &str) -> Result<Self, RulesError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        if let Some(rule) = file.rule.iter().find(|r| r.keywords.iter().any(|k| k.trim().is_empty())) {
            return Err(RulesError::EmptyKeyword(rule.category.clone()));
        }
        Ok(Self::new(file.rule))
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn find_matching_rule(&self, description: &str) -> Option<&KeywordRule> {
        let text = description.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&text))
    }

    pub fn categorize(&self, description: &str) -> &str {
        self.find_matching_rule(description)
            .map(|rule| rule.category.as_str())
            .unwrap_or(OTHER_CATEGORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        let c = Categorizer::default();
        assert_eq!(c.categorize("UBER *TRIP"), "transport");
        assert_eq!(c.categorize("Supermercado Dia"), "food");
        assert_eq!(c.categorize("NETFLIX.COM"), "leisure");
    }

    #[test]
    fn accented_keywords_match_upper_case_input() {
        let c = Categorizer::default();
        assert_eq!(c.categorize("FARMÁCIA SÃO JOÃO"), "health");
    }

    #[test]
    fn no_match_falls_back_to_other() {
        let c = Categorizer::default();
        assert_eq!(c.categorize("PIX RECEBIDO"), OTHER_CATEGORY);
        assert_eq!(c.categorize(""), OTHER_CATEGORY);
    }

    #[test]
    fn english_fragments_do_not_trigger_portuguese_rules() {
        let c = Categorizer::default();
        assert_eq!(c.categorize("CURRENT ACCOUNT FEE"), OTHER_CATEGORY);
        assert_eq!(c.categorize("PARENTS TRANSFER"), OTHER_CATEGORY);
        assert_eq!(c.categorize("SCHOOL TUITION"), OTHER_CATEGORY);
    }

    #[test]
    fn earlier_rule_wins_on_overlap() {
        let c = Categorizer::default();
        // "shell" (transport) and "bar" (leisure) both match; transport is listed first.
        assert_eq!(c.categorize("SHELL SELECT BAR"), "transport");
        // "padaria" (food) beats the "99" transport keyword.
        assert_eq!(c.categorize("PADARIA 99"), "food");
    }

    #[test]
    fn categorize_is_deterministic() {
        let c = Categorizer::default();
        let first = c.categorize("Posto Ipiranga 123").to_string();
        for _ in 0..10 {
            assert_eq!(c.categorize("Posto Ipiranga 123"), first);
        }
    }

    #[test]
    fn custom_rules_preserve_order() {
        let c = Categorizer::new(vec![
            KeywordRule::new("coffee", &["starbucks"]),
            KeywordRule::new("food", &["STARBUCKS", "market"]),
        ]);
        assert_eq!(c.categorize("Starbucks Reserve"), "coffee");
        assert_eq!(c.categorize("Farmers Market"), "food");
    }

    #[test]
    fn from_toml_reads_rules_in_file_order() {
        let c = Categorizer::from_toml(
            r#"
[[rule]]
category = "pets"
keywords = ["petz", "cobasi"]

[[rule]]
category = "food"
keywords = ["Mercado"]
"#,
        )
        .unwrap();
        assert_eq!(c.rules().len(), 2);
        assert_eq!(c.rules()[0].category, "pets");
        assert_eq!(c.categorize("COBASI MORUMBI"), "pets");
        assert_eq!(c.categorize("mercado livre"), "food");
    }

    #[test]
    fn from_toml_rejects_empty_keyword() {
        let result = Categorizer::from_toml("[[rule]]\ncategory = \"x\"\nkeywords = [\"\"]\n");
        assert!(matches!(result, Err(RulesError::EmptyKeyword(c)) if c == "x"));
    }

    #[test]
    fn from_toml_rejects_malformed() {
        assert!(matches!(Categorizer::from_toml("[[rule"), Err(RulesError::Toml(_))));
    }
}
