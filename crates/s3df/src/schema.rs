// ai
//! 📐 Schema — column names with a type tag stapled on.
//!
//! The connector itself never looks inside a schema. It carries one around and
//! hands it to the parser, like a courier who is contractually forbidden from
//! opening the envelope. Parsers are free to care. We are not.

use serde::Deserialize;

/// 🏷️ One column: a (possibly dotted) name and an opaque type tag.
///
/// Dotted names like `coords.x` are a parser convention for reaching into nested
/// objects. The tag is whatever the host engine wants it to be.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub kind: String,
}

/// 📐 An ordered list of columns.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// ➕ Append a column, builder style.
    pub fn with_column(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            kind: kind.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_columns_keep_their_place_in_line() {
        let the_schema = Schema::new()
            .with_column("coords.x", "float64")
            .with_column("coords.z", "float64")
            .with_column("date", "time");

        assert_eq!(the_schema.len(), 3);
        let the_names: Vec<&str> = the_schema.column_names().collect();
        assert_eq!(the_names, vec!["coords.x", "coords.z", "date"]);
    }

    #[test]
    fn the_one_where_a_schema_comes_out_of_json_config() {
        let the_schema: Schema = serde_json::from_str(
            r#"{ "columns": [ { "name": "a", "kind": "int64" }, { "name": "b" } ] }"#,
        )
        .expect("💀 schema JSON was valid; serde was not in the mood");

        assert_eq!(the_schema.columns[0].kind, "int64");
        assert_eq!(the_schema.columns[1].kind, "");
    }
}
