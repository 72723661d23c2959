//! Natural-language query translation
//!
//! Two translations are offered on top of [`TextGenerator`]:
//! - [`QueryGenerator::text_to_sql`] asks for a single `SELECT` over the company table
//! - [`QueryGenerator::text_to_filters`] asks for a small JSON object of filter hints
//!
//! Neither output is trusted: SQL still goes through the safety validator and
//! hints are compiled as an OR group.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;

use crate::config::AiConfig;
use crate::db::search::predicate::CompiledPredicate;
use crate::db::search::safety::UNTRANSLATABLE_SENTINEL;
use crate::metrics::GENERATION_DURATION_SECONDS;
use crate::models::{FilterField, SearchFilters, COMPANY_TABLE};

use super::text_generation::{complete_with_timeout, GenerationError, TextGenerator};

const SQL_SYSTEM_PROMPT: &str =
    "You translate company search requests into PostgreSQL. Reply with one SQL statement and nothing else.";

const FILTER_SYSTEM_PROMPT: &str =
    "You extract company search filters. Reply with a JSON object and nothing else.";

/// Column list with types, embedded in every SQL prompt.
const SCHEMA_DESCRIPTION: &str = "\
- id (integer, primary key)
- name (text)
- website (text)
- founded (integer, year)
- size (text, employee range such as '51-200')
- locality (text, city)
- region (text)
- country (text, lowercase)
- industry (text, lowercase)
- linkedin_url (text)
- ai_summary (text)
- created_at (timestamp)
- updated_at (timestamp)";

/// Candidate SQL plus the request it was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuery {
    pub sql: String,
    pub source: String,
}

/// Outcome of filter extraction that did not fail at the transport level.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterHint {
    Extracted(SearchFilters),
    NoHint,
}

#[derive(Clone)]
pub struct QueryGenerator {
    generator: Arc<dyn TextGenerator>,
    sql_max_tokens: u32,
    filter_max_tokens: u32,
    timeout: Duration,
}

impl QueryGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &AiConfig) -> Self {
        Self {
            generator,
            sql_max_tokens: config.sql_max_tokens,
            filter_max_tokens: config.filter_max_tokens,
            timeout: config.generation_timeout(),
        }
    }

    async fn generate(
        &self,
        purpose: &'static str,
        prompt: &str,
        system_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let start = Instant::now();
        let result = complete_with_timeout(
            self.generator.as_ref(),
            prompt,
            Some(system_prompt),
            max_tokens,
            self.timeout,
        )
        .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.kind(),
        };
        GENERATION_DURATION_SECONDS
            .with_label_values(&[purpose, outcome])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    /// Translate `query` into a candidate `SELECT`. Explicit conditions are
    /// embedded so the statement honors them.
    pub async fn text_to_sql(
        &self,
        query: &str,
        explicit: &CompiledPredicate,
    ) -> Result<GeneratedQuery, GenerationError> {
        let prompt = sql_prompt(query, explicit);
        let output = self
            .generate("text_to_sql", &prompt, SQL_SYSTEM_PROMPT, self.sql_max_tokens)
            .await?;

        let sql = clean_sql(&output);
        if sql.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        tracing::debug!(query = %query, sql = %sql, "Generated SQL candidate");
        Ok(GeneratedQuery {
            sql,
            source: query.to_string(),
        })
    }

    /// Extract filter hints from `query`. Unparseable output is [`FilterHint::NoHint`].
    pub async fn text_to_filters(&self, query: &str) -> Result<FilterHint, GenerationError> {
        let prompt = filter_prompt(query);
        let output = self
            .generate(
                "text_to_filters",
                &prompt,
                FILTER_SYSTEM_PROMPT,
                self.filter_max_tokens,
            )
            .await?;

        Ok(parse_filter_hint(&output))
    }
}

fn sql_prompt(query: &str, explicit: &CompiledPredicate) -> String {
    let mut prompt = format!(
        "Table `{table}` has these columns:\n{schema}\n\n\
         Write a PostgreSQL query for this request: \"{query}\"\n\n\
         Rules:\n\
         - Select with SELECT * FROM {table} only; no other tables, joins, or statements.\n\
         - Use ILIKE with % wildcards for text comparisons.\n\
         - Do not add LIMIT or OFFSET; results are paged separately.\n\
         - If the request cannot be expressed as such a query, reply exactly {sentinel}.\n",
        table = COMPANY_TABLE,
        schema = SCHEMA_DESCRIPTION,
        query = query.trim(),
        sentinel = UNTRANSLATABLE_SENTINEL,
    );

    let conditions: Vec<String> = explicit.conditions().map(|c| c.describe()).collect();
    if !conditions.is_empty() {
        prompt.push_str("- The WHERE clause must also include all of these conditions:\n");
        for condition in conditions {
            prompt.push_str("  - ");
            prompt.push_str(&condition);
            prompt.push('\n');
        }
    }

    prompt
}

fn filter_prompt(query: &str) -> String {
    let fields: Vec<&str> = FilterField::ALL.iter().map(|f| f.as_str()).collect();
    format!(
        "Extract company search filters from this request: \"{query}\"\n\n\
         Return a JSON object using only these keys: {fields}.\n\
         Text values are matched as substrings. founded_from and founded_to are years.\n\
         Omit keys you cannot infer. Return {{}} when nothing applies.\n\n\
         Example for \"fast growing tech companies in germany founded after 2015\":\n\
         {{\"industry\": \"tech\", \"country\": \"germany\", \"founded_from\": 2015}}",
        query = query.trim(),
        fields = fields.join(", "),
    )
}

/// Fence info strings dropped even when the content follows on the same line.
const FENCE_LANGUAGES: &[&str] = &["sql", "postgresql", "postgres", "pgsql", "json"];

/// Unwrap a markdown code fence if the output is wrapped in one.
fn strip_code_fences(output: &str) -> &str {
    let mut text = output.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.trim_end();
        text = rest.strip_suffix("```").unwrap_or(rest);

        // Info string: a lone word on the opening line, or a known language tag.
        let word_end = text.find(char::is_whitespace).unwrap_or(text.len());
        let word = &text[..word_end];
        let own_line = text[word_end..].starts_with(|c: char| c == '\n' || c == '\r');
        let is_language = FENCE_LANGUAGES.iter().any(|l| word.eq_ignore_ascii_case(l));
        if !word.is_empty() && (own_line || is_language) {
            text = &text[word_end..];
        }
    }
    text.trim()
}

fn clean_sql(output: &str) -> String {
    strip_code_fences(output)
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}

fn parse_filter_hint(output: &str) -> FilterHint {
    let text = strip_code_fences(output);
    match serde_json::from_str::<JsonValue>(text) {
        Ok(JsonValue::Object(object)) => {
            let filters = SearchFilters::from_json_object(&object);
            if filters.is_empty() {
                FilterHint::NoHint
            } else {
                FilterHint::Extracted(filters)
            }
        }
        Ok(_) => FilterHint::NoHint,
        Err(err) => {
            tracing::debug!(error = %err, "Filter hint output is not JSON");
            FilterHint::NoHint
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::search::predicate;
    use crate::models::FilterValue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns canned replies and records prompts.
    struct Scripted {
        reply: std::result::Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn complete(
            &self,
            prompt: &str,
            _system_prompt: Option<&str>,
            _max_tokens: u32,
        ) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply
                .clone()
                .map_err(|_| GenerationError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                })
        }
    }

    fn generator(scripted: Arc<Scripted>) -> QueryGenerator {
        QueryGenerator::new(scripted, &AiConfig::default())
    }

    #[tokio::test]
    async fn sql_prompt_embeds_schema_and_explicit_conditions() {
        let scripted =
            Scripted::ok("```sql\nSELECT * FROM companies WHERE industry ILIKE '%tech%';\n```");
        let explicit = predicate::compile(
            &SearchFilters::new()
                .with_text(FilterField::Country, "germany")
                .with(FilterField::FoundedFrom, FilterValue::Integer(2015)),
        )
        .unwrap();

        let generated = generator(scripted.clone())
            .text_to_sql("tech startups", &explicit)
            .await
            .unwrap();

        assert_eq!(
            generated.sql,
            "SELECT * FROM companies WHERE industry ILIKE '%tech%'"
        );
        assert_eq!(generated.source, "tech startups");

        let prompts = scripted.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("\"tech startups\""));
        assert!(prompt.contains("founded (integer, year)"));
        assert!(prompt.contains(UNTRANSLATABLE_SENTINEL));
        assert!(prompt.contains("country ILIKE '%germany%'"));
        assert!(prompt.contains("founded >= 2015"));
        assert!(prompt.contains("Do not add LIMIT or OFFSET"));
    }

    #[tokio::test]
    async fn sql_generation_failure_is_an_error() {
        let err = generator(Scripted::failing())
            .text_to_sql("anything", &CompiledPredicate::match_all())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "status");
    }

    #[tokio::test]
    async fn filters_are_restricted_to_known_fields() {
        let scripted = Scripted::ok(
            r#"{"industry": "software", "country": "france", "mood": "happy", "founded_from": 2010}"#,
        );
        let hint = generator(scripted)
            .text_to_filters("french software firms since 2010")
            .await
            .unwrap();

        let FilterHint::Extracted(filters) = hint else {
            panic!("expected extracted filters");
        };
        assert_eq!(filters.len(), 3);
        assert_eq!(
            filters.get(FilterField::Industry),
            Some(&FilterValue::Text("software".to_string()))
        );
        assert_eq!(
            filters.get(FilterField::FoundedFrom),
            Some(&FilterValue::Integer(2010))
        );
    }

    #[tokio::test]
    async fn unparseable_or_empty_output_is_no_hint() {
        for reply in ["I could not find filters", "{}", "[1, 2]", "```json\n{}\n```"] {
            let hint = generator(Scripted::ok(reply))
                .text_to_filters("whatever")
                .await
                .unwrap();
            assert_eq!(hint, FilterHint::NoHint, "reply {reply:?}");
        }
    }

    #[tokio::test]
    async fn filter_transport_failure_is_an_error() {
        assert!(generator(Scripted::failing())
            .text_to_filters("whatever")
            .await
            .is_err());
    }

    #[test]
    fn clean_sql_strips_fences_and_semicolons() {
        assert_eq!(clean_sql("  SELECT 1 ;; \n"), "SELECT 1");
        assert_eq!(clean_sql("```\nSELECT * FROM companies\n```"), "SELECT * FROM companies");
        assert_eq!(
            clean_sql("```sql\nSELECT * FROM companies;\n```"),
            "SELECT * FROM companies"
        );
    }

    #[test]
    fn one_line_fences_drop_the_language_tag() {
        assert_eq!(
            clean_sql("```sql SELECT * FROM companies```"),
            "SELECT * FROM companies"
        );
        assert_eq!(
            clean_sql("```PostgreSQL SELECT * FROM companies;```"),
            "SELECT * FROM companies"
        );
        assert_eq!(
            clean_sql("```SELECT * FROM companies```"),
            "SELECT * FROM companies"
        );
        assert_eq!(
            parse_filter_hint(r#"```json {"country": "germany"}```"#),
            FilterHint::Extracted(SearchFilters::new().with_text(FilterField::Country, "germany"))
        );
    }
}
