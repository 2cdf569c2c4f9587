//! Text analysis shared by indexing and querying.

use crate::error::IndexError;
use std::fmt;
use tantivy::tokenizer::{
    AsciiFoldingFilter, Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer,
    StopWordFilter, TextAnalyzer, TokenStream,
};
use tantivy::Index;

/// Name the analyzer is registered under and recorded in the manifest.
pub const ENGLISH_ANALYZER: &str = "en_stem_stop";

/// Tokens longer than this are dropped.
const MAX_TOKEN_LEN: usize = 40;

/// Tokenizer applied to every analyzed field and, through tantivy's query
/// parser, to query terms.
///
/// tantivy's `en_stem` chain (simple tokenizer, long-token removal,
/// lower-casing, Snowball stemming) with ASCII folding and English stop
/// words added. Tokenizers are not persisted by tantivy, so every opened
/// [`Index`] gets it registered again and its name is kept in the manifest.
#[derive(Clone)]
pub struct Analyzer {
    name: &'static str,
    inner: TextAnalyzer,
}

impl Analyzer {
    pub fn english() -> Result<Self, IndexError> {
        let stop_words = StopWordFilter::new(Language::English).ok_or_else(|| {
            IndexError::Storage("English stop word list is unavailable".to_string())
        })?;
        let inner = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(MAX_TOKEN_LEN))
            .filter(LowerCaser)
            .filter(AsciiFoldingFilter)
            .filter(stop_words)
            .filter(Stemmer::new(Language::English))
            .build();
        Ok(Self {
            name: ENGLISH_ANALYZER,
            inner,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Makes the analyzer available to `index` under its name.
    pub(crate) fn register(&self, index: &Index) {
        index.tokenizers().register(self.name, self.inner.clone());
    }

    /// Splits `text` into index terms, in order, duplicates kept.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            terms.push(stream.token().text.clone());
        }
        terms
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer").field("name", &self.name).finish()
    }
}
