//! Query language.
//!
//! ```text
//! tuition fees                  both terms, in any default field
//! title:library OR books        either group
//! description:"opening hours"   the phrase, in one field
//! url:www.example.org/fees      exact match on an ID field
//! open 10:30                    a prefix that names no field is plain text
//! ```
//!
//! Whitespace-separated terms are AND-ed; the bare word `OR` separates
//! alternative groups and a bare `AND` is accepted between terms. The parsed
//! query is rendered into tantivy's query syntax with every value quoted, so
//! tantivy's `QueryParser` analyzes text values with the index analyzer and
//! user input never reaches its operator grammar.

use super::SearchError;
use crate::document::canonicalize_url;
use crate::index::Field;

/// One query term, unanalyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTerm {
    /// Free text; every analyzed token must match. `None` searches the
    /// default fields.
    Text { field: Option<Field>, text: String },
    /// Exact value of a unique key field
    Exact { field: Field, value: String },
}

/// A parsed query: alternatives of conjunctions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub groups: Vec<Vec<QueryTerm>>,
}

impl ParsedQuery {
    /// `true` for a blank query.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The query in tantivy's syntax: quoted values, `AND` within a group,
    /// parenthesized groups joined by `OR`.
    pub fn to_query_string(&self) -> String {
        let groups: Vec<String> = self
            .groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(QueryTerm::to_query_string)
                    .collect::<Vec<_>>()
                    .join(" AND ")
            })
            .collect();
        match groups.as_slice() {
            [single] => single.clone(),
            _ => groups
                .iter()
                .map(|group| format!("({})", group))
                .collect::<Vec<_>>()
                .join(" OR "),
        }
    }
}

impl QueryTerm {
    fn to_query_string(&self) -> String {
        match self {
            QueryTerm::Text { field: None, text } => quote(text),
            QueryTerm::Text {
                field: Some(field),
                text,
            } => format!("{}:{}", field.name(), quote(text)),
            QueryTerm::Exact { field, value } => format!("{}:{}", field.name(), quote(value)),
        }
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace(['"', '\\'], " "))
}

/// A lexeme before field resolution.
#[derive(Debug, PartialEq)]
struct Word {
    field: Option<String>,
    value: String,
    quoted: bool,
}

/// Parses query text.
pub fn parse(input: &str) -> Result<ParsedQuery, SearchError> {
    let words = lex(input)?;

    let mut groups: Vec<Vec<QueryTerm>> = Vec::new();
    let mut current: Vec<QueryTerm> = Vec::new();
    let mut pending_and = false;

    for word in words {
        if word.field.is_none() && !word.quoted {
            match word.value.as_str() {
                "OR" => {
                    if current.is_empty() || pending_and {
                        return Err(malformed("OR must separate two terms"));
                    }
                    groups.push(std::mem::take(&mut current));
                    continue;
                }
                "AND" => {
                    if current.is_empty() || pending_and {
                        return Err(malformed("AND must join two terms"));
                    }
                    pending_and = true;
                    continue;
                }
                _ => {}
            }
        }
        pending_and = false;
        current.push(resolve(word)?);
    }

    if pending_and {
        return Err(malformed("AND must join two terms"));
    }
    if current.is_empty() {
        if !groups.is_empty() {
            return Err(malformed("OR must separate two terms"));
        }
    } else {
        groups.push(current);
    }
    Ok(ParsedQuery { groups })
}

fn resolve(word: Word) -> Result<QueryTerm, SearchError> {
    let value = word.value.trim().to_string();
    let Some(name) = word.field else {
        if value.is_empty() {
            return Err(malformed("empty quoted phrase"));
        }
        return Ok(QueryTerm::Text { field: None, text: value });
    };

    let Some(field) = Field::from_name(&name) else {
        // `10:30`, `http://...`: the prefix is part of the text
        return Ok(QueryTerm::Text {
            field: None,
            text: format!("{}:{}", name, value),
        });
    };
    if value.is_empty() {
        return Err(malformed(&format!("field '{}' has no value", name)));
    }
    if field == Field::Url {
        Ok(QueryTerm::Exact {
            field,
            value: canonicalize_url(&value),
        })
    } else if field.is_id() {
        Ok(QueryTerm::Exact { field, value })
    } else {
        Ok(QueryTerm::Text {
            field: Some(field),
            text: value,
        })
    }
}

fn lex(input: &str) -> Result<Vec<Word>, SearchError> {
    let mut words = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };

        if first == '"' {
            chars.next();
            words.push(Word {
                field: None,
                value: read_quoted(&mut chars)?,
                quoted: true,
            });
            continue;
        }

        let mut bare = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '"') {
            bare.push(c);
        }

        match bare.split_once(':') {
            Some((field, value)) if !field.is_empty() => {
                let field = field.to_string();
                if value.is_empty() && chars.next_if_eq(&'"').is_some() {
                    words.push(Word {
                        field: Some(field),
                        value: read_quoted(&mut chars)?,
                        quoted: true,
                    });
                } else {
                    words.push(Word {
                        field: Some(field),
                        value: value.to_string(),
                        quoted: false,
                    });
                }
            }
            _ => words.push(Word {
                field: None,
                value: bare,
                quoted: false,
            }),
        }
    }
    Ok(words)
}

/// Reads up to the closing quote; the opening quote is already consumed.
fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String, SearchError> {
    let mut value = String::new();
    for c in chars.by_ref() {
        if c == '"' {
            return Ok(value);
        }
        value.push(c);
    }
    Err(malformed("unterminated quote"))
}

fn malformed(reason: &str) -> SearchError {
    SearchError::MalformedQuery(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(field: Option<Field>, value: &str) -> QueryTerm {
        QueryTerm::Text {
            field,
            text: value.to_string(),
        }
    }

    fn assert_malformed(input: &str) {
        match parse(input) {
            Err(SearchError::MalformedQuery(_)) => {}
            other => panic!("{:?} should be malformed, got {:?}", input, other),
        }
    }

    #[test]
    fn test_terms_are_anded() {
        let query = parse("tuition  fees").unwrap();
        assert_eq!(
            query.groups,
            vec![vec![text(None, "tuition"), text(None, "fees")]]
        );
    }

    #[test]
    fn test_or_splits_groups() {
        let query = parse("title:library OR books AND loans").unwrap();
        assert_eq!(
            query.groups,
            vec![
                vec![text(Some(Field::Title), "library")],
                vec![text(None, "books"), text(None, "loans")],
            ]
        );
    }

    #[test]
    fn test_quoted_values() {
        let query = parse(r#"description:"opening hours" "term dates""#).unwrap();
        assert_eq!(
            query.groups,
            vec![vec![
                text(Some(Field::Description), "opening hours"),
                text(None, "term dates"),
            ]]
        );
    }

    #[test]
    fn test_id_fields_are_exact() {
        let query = parse("url:http://www.example.org/fees/ path:\"a b.html\"").unwrap();
        assert_eq!(
            query.groups,
            vec![vec![
                QueryTerm::Exact {
                    field: Field::Url,
                    value: "www.example.org/fees".to_string()
                },
                QueryTerm::Exact {
                    field: Field::Path,
                    value: "a b.html".to_string()
                },
            ]]
        );
    }

    #[test]
    fn test_unknown_field_prefix_is_text() {
        let query = parse("fees 10:30").unwrap();
        assert_eq!(
            query.groups,
            vec![vec![text(None, "fees"), text(None, "10:30")]]
        );

        let query = parse("http://example.org/fees").unwrap();
        assert_eq!(
            query.groups,
            vec![vec![text(None, "http://example.org/fees")]]
        );

        let query = parse("body:text").unwrap();
        assert_eq!(query.groups, vec![vec![text(None, "body:text")]]);
    }

    #[test]
    fn test_renders_quoted_query_string() {
        let query = parse(r#"title:library OR books AND "opening hours""#).unwrap();
        assert_eq!(
            query.to_query_string(),
            r#"(title:"library") OR ("books" AND "opening hours")"#
        );

        let single = parse("fees 10:30").unwrap();
        assert_eq!(single.to_query_string(), r#""fees" AND "10:30""#);

        let exact = parse("url:https://example.org/fees/").unwrap();
        assert_eq!(exact.to_query_string(), r#"url:"example.org/fees""#);
    }

    #[test]
    fn test_lowercase_or_is_a_term() {
        let query = parse("black or white").unwrap();
        assert_eq!(query.groups.len(), 1);
        assert_eq!(query.groups[0].len(), 3);
    }

    #[test]
    fn test_quoted_or_is_a_term() {
        let query = parse(r#"a "OR" b"#).unwrap();
        assert_eq!(query.groups.len(), 1);
    }

    #[test]
    fn test_blank_query_is_empty() {
        assert!(parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_queries() {
        assert_malformed(r#"title:"unterminated"#);
        assert_malformed(r#""open"#);
        assert_malformed("title:");
        assert_malformed(r#"title:"""#);
        assert_malformed("OR fees");
        assert_malformed("fees OR");
        assert_malformed("fees OR OR tuition");
        assert_malformed("fees AND");
        assert_malformed(r#""""#);
    }
}
