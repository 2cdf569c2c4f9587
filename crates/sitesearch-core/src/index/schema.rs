//! tantivy schema and document conversion.

use super::{DocNum, Field, ENGLISH_ANALYZER};
use crate::document::Document;
use crate::error::IndexError;
use tantivy::schema::{
    self, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, FAST, STORED, STRING,
};
use tantivy::TantivyDocument;

/// Fast field holding the stored pagerank.
pub(crate) const PAGERANK_FIELD: &str = "pagerank";

/// Fast field holding the insertion order.
pub(crate) const ORDINAL_FIELD: &str = "ordinal";

/// Handles of every schema field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexFields {
    fields: [schema::Field; 7],
    pub pagerank: schema::Field,
    pub ordinal: schema::Field,
}

impl IndexFields {
    /// Builds the schema the writer creates indexes with.
    pub fn build() -> (Schema, IndexFields) {
        let mut builder = Schema::builder();
        let fields = Field::ALL.map(|field| {
            if field.is_id() {
                builder.add_text_field(field.name(), STRING | STORED)
            } else {
                builder.add_text_field(field.name(), text_options(field))
            }
        });
        let pagerank = builder.add_f64_field(PAGERANK_FIELD, FAST | STORED);
        let ordinal = builder.add_u64_field(ORDINAL_FIELD, FAST);
        (
            builder.build(),
            IndexFields {
                fields,
                pagerank,
                ordinal,
            },
        )
    }

    /// Resolves the handles of an opened index.
    pub fn resolve(schema: &Schema) -> Result<IndexFields, IndexError> {
        let mut fields = Vec::with_capacity(Field::ALL.len());
        for field in Field::ALL {
            fields.push(schema.get_field(field.name())?);
        }
        let fields = fields.try_into().map_err(|_| {
            IndexError::Storage("Schema field count does not match".to_string())
        })?;
        Ok(IndexFields {
            fields,
            pagerank: schema.get_field(PAGERANK_FIELD)?,
            ordinal: schema.get_field(ORDINAL_FIELD)?,
        })
    }

    pub fn get(&self, field: Field) -> schema::Field {
        // Field::ALL order
        self.fields[field as usize]
    }

    /// The sitesearch field behind a tantivy handle.
    pub fn field_of(&self, handle: schema::Field) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|&field| self.get(field) == handle)
    }

    pub fn to_tantivy(&self, doc: &Document, ordinal: DocNum) -> TantivyDocument {
        let mut tantivy_doc = TantivyDocument::default();
        for field in Field::ALL {
            tantivy_doc.add_text(self.get(field), field.value_of(doc));
        }
        tantivy_doc.add_f64(self.pagerank, doc.pagerank);
        tantivy_doc.add_u64(self.ordinal, ordinal);
        tantivy_doc
    }

    /// Reconstructs a document from its stored fields.
    ///
    /// `content`, `links_out` and `links_in` are not stored and come back empty.
    pub fn from_tantivy(&self, stored: &TantivyDocument) -> Document {
        let text = |field: Field| {
            stored
                .get_first(self.get(field))
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Document {
            path: text(Field::Path),
            url: text(Field::Url),
            title: text(Field::Title),
            description: text(Field::Description),
            keywords: text(Field::Keywords),
            content: String::new(),
            links_out: Vec::new(),
            links_in: Vec::new(),
            links_in_keywords: text(Field::LinksInKeywords),
            pagerank: stored
                .get_first(self.pagerank)
                .and_then(|value| value.as_f64())
                .unwrap_or_default(),
        }
    }
}

fn text_options(field: Field) -> TextOptions {
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(ENGLISH_ANALYZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let options = TextOptions::default().set_indexing_options(indexing);
    if field.is_stored() {
        options.set_stored()
    } else {
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_follow_field_order() {
        let (schema, fields) = IndexFields::build();
        for field in Field::ALL {
            assert_eq!(schema.get_field_name(fields.get(field)), field.name());
            assert_eq!(fields.field_of(fields.get(field)), Some(field));
        }
        assert_eq!(fields.field_of(fields.pagerank), None);
    }

    #[test]
    fn test_resolve_matches_build() {
        let (schema, built) = IndexFields::build();
        let resolved = IndexFields::resolve(&schema).unwrap();
        for field in Field::ALL {
            assert_eq!(resolved.get(field), built.get(field));
        }
        assert_eq!(resolved.pagerank, built.pagerank);
        assert_eq!(resolved.ordinal, built.ordinal);
    }

    #[test]
    fn test_stored_round_trip_drops_content() {
        let (_, fields) = IndexFields::build();
        let mut doc = Document::new("fees.html", "example.org/fees")
            .with_title("Tuition fees")
            .with_keywords("fees")
            .with_content("Not stored");
        doc.pagerank = 1.75;

        let back = fields.from_tantivy(&fields.to_tantivy(&doc, 0));
        assert_eq!(back.url, "example.org/fees");
        assert_eq!(back.title, "Tuition fees");
        assert_eq!(back.keywords, "fees");
        assert_eq!(back.pagerank, 1.75);
        assert_eq!(back.content, "");
    }
}
