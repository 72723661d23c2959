use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Field-keyed row as returned to callers, independent of the store's row type.
pub type Record = Map<String, JsonValue>;

/// Table holding the directory; the only table generated SQL may touch.
pub const COMPANY_TABLE: &str = "companies";

/// Primary key column used for deterministic ordering.
pub const COMPANY_PRIMARY_KEY: &str = "id";

/// Columns of the company table, in schema order.
pub const COMPANY_COLUMNS: &[&str] = &[
    "id",
    "website",
    "name",
    "founded",
    "size",
    "locality",
    "region",
    "country",
    "industry",
    "linkedin_url",
    "ai_summary",
    "created_at",
    "updated_at",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: i32,
    pub website: Option<String>,
    pub name: String,
    pub founded: Option<i32>,
    pub size: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub industry: Option<String>,
    pub linkedin_url: Option<String>,
    pub ai_summary: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Company {
    pub fn into_record(self) -> Record {
        match serde_json::to_value(self) {
            Ok(JsonValue::Object(map)) => map,
            // A struct of plain fields always serializes to an object.
            _ => Record::new(),
        }
    }

    /// Location rendered as "locality, region, country", skipping blanks.
    pub fn location(&self) -> String {
        [&self.locality, &self.region, &self.country]
            .iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Company row to insert (sample data loading).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub founded: Option<i32>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

impl NewCompany {
    /// Build from one line of a JSON-lines export. Text fields are trimmed and
    /// blanks dropped; `founded` accepts a number or a digit string.
    pub fn from_json_line(line: &str) -> Result<Self, String> {
        let value: JsonValue = serde_json::from_str(line).map_err(|e| e.to_string())?;
        let JsonValue::Object(row) = value else {
            return Err("line is not a JSON object".to_string());
        };

        let text = |key: &str| {
            row.get(key)
                .and_then(JsonValue::as_str)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let founded = match row.get("founded") {
            Some(JsonValue::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Some(JsonValue::String(s)) => s.trim().parse::<i32>().ok(),
            _ => None,
        };

        Ok(Self {
            name: text("name").unwrap_or_default(),
            website: text("website"),
            founded: founded.filter(|year| *year > 0),
            size: text("size"),
            locality: text("locality"),
            region: text("region"),
            country: text("country"),
            industry: text("industry"),
            linkedin_url: text("linkedin_url"),
        })
    }
}
