//! Tantivy Indexer for Folio
//!
//! Builds an in-RAM index over the page snapshot with one text field per
//! record field, all sharing a stemming analyzer. Field weights are applied at
//! query time through `BoostQuery`, so one index serves any weight config.

use crate::config::FieldWeights;
use crate::interface::Field;
use crate::query::{Clause, ParsedQuery, Presence};
use crate::snapshot::IndexSnapshot;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::{
    Field as SchemaField, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, FAST,
    STORED, STRING,
};
use tantivy::tokenizer::{Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer};
use tantivy::{Index, IndexReader, ReloadPolicy, Term};
use thiserror::Error;

const ANALYZER: &str = "folio";

/// Tantivy's floor for a single indexing thread
const WRITER_MEMORY_BYTES: usize = 15_000_000;

/// Error type for indexer operations
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),
    #[error("Analyzer `{0}` is not registered")]
    MissingAnalyzer(&'static str),
}

pub type IndexerResult<T> = Result<T, IndexerError>;

/// One matching page before truncation and display lookup
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDoc {
    pub permalink: String,
    pub score: f32,
    /// Position in the snapshot the index was built from
    pub ordinal: u64,
}

pub struct Indexer {
    index: Index,
    reader: IndexReader,
    permalink_field: SchemaField,
    ordinal_field: SchemaField,
    text_fields: [SchemaField; 4],
    weights: FieldWeights,
}

impl Indexer {
    /// Index every record of the snapshot, in snapshot order.
    pub fn build(snapshot: &IndexSnapshot, weights: FieldWeights) -> IndexerResult<Self> {
        let schema = Self::build_schema();
        let index = Index::create_in_ram(schema.clone());
        Self::register_tokenizer(&index);

        let permalink_field = schema.get_field("permalink")?;
        let ordinal_field = schema.get_field("ordinal")?;
        let text_fields = [
            schema.get_field(Field::Title.name())?,
            schema.get_field(Field::Tags.name())?,
            schema.get_field(Field::Summary.name())?,
            schema.get_field(Field::Content.name())?,
        ];

        // Single thread keeps doc ids in snapshot order within one segment
        let mut writer: tantivy::IndexWriter =
            index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
        for (ordinal, record) in snapshot.records().iter().enumerate() {
            let mut doc = tantivy::TantivyDocument::default();
            doc.add_text(permalink_field, &record.permalink);
            doc.add_u64(ordinal_field, ordinal as u64);
            for (field, schema_field) in Field::ALL.into_iter().zip(text_fields) {
                doc.add_text(schema_field, record.field_text(field));
            }
            writer.add_document(doc)?;
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            permalink_field,
            ordinal_field,
            text_fields,
            weights,
        })
    }

    fn build_schema() -> Schema {
        let mut builder = Schema::builder();
        builder.add_text_field("permalink", STRING | STORED);
        builder.add_u64_field("ordinal", STORED | FAST);

        let text_indexing = TextFieldIndexing::default()
            .set_tokenizer(ANALYZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let text_options = TextOptions::default().set_indexing_options(text_indexing);
        for field in Field::ALL {
            builder.add_text_field(field.name(), text_options.clone());
        }
        builder.build()
    }

    /// Word tokens, lowercased and reduced to English stems.
    fn register_tokenizer(index: &Index) {
        let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(40))
            .filter(LowerCaser)
            .filter(Stemmer::new(Language::English))
            .build();
        index.tokenizers().register(ANALYZER, analyzer);
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn schema_field(&self, field: Field) -> SchemaField {
        match field {
            Field::Title => self.text_fields[0],
            Field::Tags => self.text_fields[1],
            Field::Summary => self.text_fields[2],
            Field::Content => self.text_fields[3],
        }
    }

    /// Run the text through the index analyzer.
    fn analyze(&self, text: &str) -> IndexerResult<Vec<String>> {
        let mut analyzer = self
            .index
            .tokenizers()
            .get(ANALYZER)
            .ok_or(IndexerError::MissingAnalyzer(ANALYZER))?;
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while let Some(token) = stream.next() {
            tokens.push(token.text.clone());
        }
        Ok(tokens)
    }

    /// Queries matching one clause's term in one field (unboosted).
    ///
    /// Wildcard terms become an anchored regex over indexed terms and skip
    /// stemming. Other terms are analyzed like document text, then matched
    /// exactly or within the clause's edit distance.
    fn term_queries(&self, field: SchemaField, clause: &Clause) -> IndexerResult<Vec<Box<dyn Query>>> {
        if clause.is_wildcard() {
            let pattern = clause
                .term
                .to_lowercase()
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            let query = RegexQuery::from_pattern(&pattern, field)?;
            return Ok(vec![Box::new(query)]);
        }

        let queries = self
            .analyze(&clause.term)?
            .into_iter()
            .map(|token| {
                let term = Term::from_field_text(field, &token);
                let query: Box<dyn Query> = match clause.edit_distance {
                    Some(distance) if distance > 0 => {
                        Box::new(FuzzyTermQuery::new(term, distance, true))
                    }
                    _ => Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
                };
                query
            })
            .collect();
        Ok(queries)
    }

    /// Translate parsed clauses into one weighted boolean query.
    ///
    /// Each clause is a disjunction over its fields, every field query boosted
    /// by field weight × clause boost. Clause presence maps onto `Occur`.
    /// Returns `None` when no clause produced a term (e.g. punctuation only).
    fn build_query(&self, parsed: &ParsedQuery) -> IndexerResult<Option<Box<dyn Query>>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(parsed.clauses.len());

        for clause in &parsed.clauses {
            let fields: Vec<Field> = match clause.field {
                Some(field) => vec![field],
                None => Field::ALL.to_vec(),
            };

            let mut per_field: Vec<(Occur, Box<dyn Query>)> = Vec::new();
            for field in fields {
                let boost = self.weights.weight(field) * clause.boost;
                for query in self.term_queries(self.schema_field(field), clause)? {
                    per_field.push((Occur::Should, Box::new(BoostQuery::new(query, boost))));
                }
            }
            if per_field.is_empty() {
                continue;
            }

            let occur = match clause.presence {
                Presence::Optional => Occur::Should,
                Presence::Required => Occur::Must,
                Presence::Prohibited => Occur::MustNot,
            };
            clauses.push((occur, Box::new(BooleanQuery::new(per_field))));
        }

        if clauses.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(BooleanQuery::new(clauses))))
    }

    /// Every matching page, best score first, ties in snapshot order.
    pub fn search(&self, parsed: &ParsedQuery) -> IndexerResult<Vec<RankedDoc>> {
        let Some(query) = self.build_query(parsed)? else {
            return Ok(Vec::new());
        };

        let searcher = self.reader.searcher();
        let limit = (searcher.num_docs() as usize).max(1);
        let top_docs = searcher.search(query.as_ref(), &TopDocs::with_limit(limit).order_by_score())?;

        let mut ranked = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: tantivy::TantivyDocument = searcher.doc(doc_address)?;
            let permalink = doc
                .get_first(self.permalink_field)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let ordinal = doc
                .get_first(self.ordinal_field)
                .and_then(|v| v.as_u64())
                .unwrap_or(u64::MAX);
            ranked.push(RankedDoc { permalink, score, ordinal });
        }

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.ordinal.cmp(&b.ordinal)));
        Ok(ranked)
    }
}
