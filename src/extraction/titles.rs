use crate::error::{config_error, BotResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One canonical title and the keywords that map to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleMapping {
    pub canonical: String,
    pub keywords: Vec<String>,
}

impl TitleMapping {
    pub fn new(canonical: &str, keywords: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TitlesFile {
    #[serde(default, rename = "title")]
    titles: Vec<TitleMapping>,
}

/// Built-in rules, used when no `config/titles.toml` is present.
/// The dentist rule precedes the generic doctor rule.
pub fn default_mappings() -> Vec<TitleMapping> {
    vec![
        TitleMapping::new(
            "Зубной врач",
            &[
                "зубной",
                "зубному",
                "зубного",
                "стоматолог",
                "стоматологу",
                "стоматолога",
                "стоматология",
                "dentist",
            ],
        ),
        TitleMapping::new(
            "Приём у врача",
            &["к врачу", "врачу", "врач", "врача", "приём у врача", "прием у врача", "doctor"],
        ),
        TitleMapping::new(
            "Налоговая",
            &[
                "налоговую",
                "налоговая",
                "налоговой",
                "налоговая инспекция",
                "ифнс",
                "tax office",
            ],
        ),
    ]
}

fn compile(mapping: &TitleMapping) -> Option<Regex> {
    let mut keywords: Vec<String> = mapping
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| {
            k.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    if keywords.is_empty() || mapping.canonical.trim().is_empty() {
        return None;
    }
    keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));
    Regex::new(&format!(r"(?i)\b(?:{})\b", keywords.join("|"))).ok()
}

/// Rewrites titles that mention a known keyword to a preferred wording.
///
/// Rules are checked in order and the first match wins.
#[derive(Debug, Clone)]
pub struct TitleCanonicalizer {
    rules: Vec<(TitleMapping, Regex)>,
}

impl TitleCanonicalizer {
    pub fn new(mappings: Vec<TitleMapping>) -> BotResult<Self> {
        let rules = mappings
            .into_iter()
            .map(|mapping| match compile(&mapping) {
                Some(regex) => Ok((mapping, regex)),
                None => Err(config_error(&format!(
                    "Title rule '{}' needs a canonical title and at least one keyword",
                    mapping.canonical
                ))),
            })
            .collect::<BotResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Parse `[[title]]` tables from a TOML document
    pub fn from_toml(content: &str) -> BotResult<Self> {
        let file: TitlesFile = toml::from_str(content)?;
        Self::new(file.titles)
    }

    /// Canonical title for the first rule whose keyword occurs in `text`
    pub fn find(&self, text: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(mapping, _)| mapping.canonical.as_str())
    }

    /// Canonical title if a rule matches, otherwise the trimmed input
    pub fn canonicalize(&self, title: &str) -> String {
        match self.find(title) {
            Some(canonical) => canonical.to_string(),
            None => title.trim().to_string(),
        }
    }

    pub fn mappings(&self) -> impl Iterator<Item = &TitleMapping> {
        self.rules.iter().map(|(mapping, _)| mapping)
    }
}

impl Default for TitleCanonicalizer {
    fn default() -> Self {
        Self {
            rules: default_mappings()
                .into_iter()
                .filter_map(|mapping| compile(&mapping).map(|regex| (mapping, regex)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("запиши меня к зубному", "Зубной врач" ; "dentist dative")]
    #[test_case("Стоматолог", "Зубной врач" ; "dentist capitalized")]
    #[test_case("dentist appointment", "Зубной врач" ; "dentist english")]
    #[test_case("зубной врач", "Зубной врач" ; "dentist beats doctor")]
    #[test_case("к врачу", "Приём у врача" ; "doctor")]
    #[test_case("сходить в налоговую", "Налоговая" ; "tax office")]
    #[test_case("Tax   office visit", "Налоговая" ; "multi word keyword")]
    #[test_case("  Обед с Анной ", "Обед с Анной" ; "no rule matches")]
    fn test_canonicalize(title: &str, expected: &str) {
        assert_eq!(TitleCanonicalizer::default().canonicalize(title), expected);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let titles = TitleCanonicalizer::default();
        // "врачевание" contains "врач" but is a different word
        assert_eq!(titles.find("врачевание"), None);
    }

    #[test]
    fn test_from_toml() {
        let titles = TitleCanonicalizer::from_toml(
            r#"
            [[title]]
            canonical = "Стрижка"
            keywords = ["парикмахер", "барбер", "haircut"]
            "#,
        )
        .unwrap();

        assert_eq!(titles.canonicalize("к барберу"), "к барберу");
        assert_eq!(titles.canonicalize("записаться к парикмахер"), "Стрижка");
        assert_eq!(titles.mappings().count(), 1);
    }

    #[test]
    fn test_rule_without_keywords_is_rejected() {
        let result = TitleCanonicalizer::new(vec![TitleMapping::new("Пусто", &[])]);
        assert!(result.is_err());
    }
}
