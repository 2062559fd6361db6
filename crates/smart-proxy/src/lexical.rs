//! In-memory fuzzy lexical index over a namespace's bound tools (specification §4.2).
//!
//! Rebuilt in full on every `bind`; never mutated in place, and never
//! persisted — only vector embeddings survive a restart.

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query};
use tantivy::schema::{Field, STORED, STRING, Schema, TEXT, Value};
use tantivy::{Index, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::tool::ToolDescriptor;

const WRITER_HEAP_BYTES: usize = 32 * 1024 * 1024;

struct Fields {
    method: Field,
    description: Field,
    parameter_descriptions: Field,
    unique_id: Field,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();

    let method = builder.add_text_field("method", TEXT);
    let description = builder.add_text_field("description", TEXT);
    let parameter_descriptions = builder.add_text_field("parameter_descriptions", TEXT);
    let unique_id = builder.add_text_field("unique_id", STRING | STORED);

    (
        builder.build(),
        Fields {
            method,
            description,
            parameter_descriptions,
            unique_id,
        },
    )
}

/// A fuzzy lexical index over `{method, description, parameterDescriptions}`.
///
/// One instance is built per `bind` call and discarded on the next; it
/// holds no reference back to the orchestrator's tool table.
pub struct LexicalIndex {
    index: Index,
    fields: Fields,
    fuzzy: f32,
    description_boost: f32,
}

impl LexicalIndex {
    /// Builds a fresh index over `tools`. `fuzzy` is the edit-distance
    /// tolerance in `[0, 1]`; `description_boost` multiplies the
    /// `description` field's contribution to a document's score.
    pub fn build(tools: &[ToolDescriptor], fuzzy: f32, description_boost: f32) -> tantivy::Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);

        let mut writer: IndexWriter = index.writer(WRITER_HEAP_BYTES)?;

        for tool in tools {
            writer.add_document(tantivy::doc!(
                fields.method => tool.original_name.clone(),
                fields.description => tool.description.clone(),
                fields.parameter_descriptions => tool.parameter_descriptions(),
                fields.unique_id => tool.unique_id(),
            ))?;
        }

        writer.commit()?;

        Ok(Self {
            index,
            fields,
            fuzzy,
            description_boost,
        })
    }

    /// An index over zero tools. `discover` against it returns an empty list.
    pub fn empty() -> Self {
        Self::build(&[], 0.2, 2.0).expect("building an index over zero documents cannot fail")
    }

    /// Searches for `query`, returning `(unique_id, raw_score)` pairs
    /// ordered by descending raw score. Tokens are OR-combined; prefix
    /// matching and fuzzy edit distance are always enabled.
    pub fn search(&self, query: &str, limit: usize) -> tantivy::Result<Vec<(String, f32)>> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let searcher = reader.searcher();

        let edit_distance = fuzzy_to_distance(self.fuzzy);
        let query = self.build_query(query, edit_distance);

        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut results = Vec::with_capacity(top_docs.len());

        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;

            let Some(unique_id) = doc.get_first(self.fields.unique_id).and_then(Value::as_str) else {
                continue;
            };

            results.push((unique_id.to_string(), score));
        }

        Ok(results)
    }

    fn build_query(&self, query: &str, edit_distance: u8) -> BooleanQuery {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for token in query.split_whitespace() {
            let lowercase = token.to_lowercase();

            for (field, boost) in [
                (self.fields.method, 1.0),
                (self.fields.description, self.description_boost),
                (self.fields.parameter_descriptions, 1.0),
            ] {
                let term = Term::from_field_text(field, &lowercase);
                let fuzzy = FuzzyTermQuery::new_prefix(term, edit_distance, true);
                clauses.push((Occur::Should, Box::new(BoostQuery::new(Box::new(fuzzy), boost))));
            }
        }

        BooleanQuery::new(clauses)
    }
}

/// Maps the `[0, 1]` configuration knob to tantivy's integer edit distance,
/// capped at 2 (tantivy's own `FuzzyTermQuery` ceiling).
fn fuzzy_to_distance(fuzzy: f32) -> u8 {
    ((fuzzy.clamp(0.0, 1.0) * 2.0).round() as u8).min(2)
}

/// Normalizes raw tantivy scores to `(0, 1]` by dividing by the top score,
/// so lexical and vector results share the dynamic-limit selector's
/// threshold space.
pub fn normalize(raw_scores: &[f32]) -> Vec<f32> {
    let Some(&top) = raw_scores.first() else {
        return Vec::new();
    };

    if top <= 0.0 {
        return raw_scores.iter().map(|_| 0.0).collect();
    }

    raw_scores.iter().map(|score| score / top).collect()
}
