use std::collections::HashMap;
use std::sync::Arc;

use ndarray::Array1;
use parking_lot::Mutex;

use talentrag_core::{Error, GenerationSettings, Result};
use talentrag_corpus::CorpusIndex;
use talentrag_infer::{
    EmbedderBackend, EmbeddingResult, GenerationEngine, WhitespaceTokenCounter,
};
use talentrag_rag::{GenerationRequest, RagPipeline};

struct FakeEncoder {
    vectors: HashMap<&'static str, Vec<f32>>,
}

impl FakeEncoder {
    fn new() -> Self {
        let vectors = HashMap::from([
            ("vaga Python", vec![0.9, 0.1]),
            ("vaga Java", vec![0.1, 0.9]),
            ("vaga explode", vec![0.5, 0.5]),
        ]);
        Self { vectors }
    }
}

impl EmbedderBackend for FakeEncoder {
    fn name(&self) -> &str {
        "fake-encoder"
    }

    fn embed(&self, text: &str) -> Result<EmbeddingResult> {
        let vector = self
            .vectors
            .get(text)
            .cloned()
            .ok_or_else(|| Error::Embedding(format!("unknown query {:?}", text)))?;
        Ok(EmbeddingResult {
            embedding: Array1::from_vec(vector),
            cached: false,
        })
    }

    fn dimension(&self) -> usize {
        2
    }
}

/// Answers with the first retrieved context wrapped in special tokens.
#[derive(Default)]
struct FakeGenerator {
    prompts: Mutex<Vec<String>>,
}

impl GenerationEngine for FakeGenerator {
    fn name(&self) -> &str {
        "fake-generator"
    }

    fn generate(&self, prompt: &str, max_new_tokens: usize) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if prompt.contains("explode") {
            return Err(Error::GenerationFailure("decoder crashed".into()));
        }
        let context = prompt.lines().nth(2).unwrap_or("nada");
        Ok(format!(
            "<s> Perfil: {} ({} tokens)<|endoftext|><pad>",
            context, max_new_tokens
        ))
    }
}

fn corpus() -> Arc<CorpusIndex> {
    Arc::new(
        CorpusIndex::build(
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec!["Python, Django, SQL".into(), "Java, Spring".into()],
        )
        .unwrap(),
    )
}

fn pipeline_with(top_k: usize) -> (RagPipeline, Arc<FakeGenerator>) {
    let generator = Arc::new(FakeGenerator::default());
    let settings = GenerationSettings {
        top_k,
        ..Default::default()
    };
    let pipeline = RagPipeline::new(
        corpus(),
        Arc::new(FakeEncoder::new()),
        generator.clone(),
        Arc::new(WhitespaceTokenCounter),
        settings,
    )
    .unwrap();
    (pipeline, generator)
}

#[test]
fn test_python_query_retrieves_python_context() {
    let (pipeline, generator) = pipeline_with(1);

    let result = pipeline.answer("vaga Python").unwrap();
    assert_eq!(result.context_texts(), vec!["Python, Django, SQL"]);
    assert_eq!(result.retrieved[0].index, 0);

    let prompts = generator.prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("vaga Python"));
    assert!(prompts[0].contains("Python, Django, SQL"));
    assert!(!prompts[0].contains("Java, Spring"));
}

#[test]
fn test_answer_is_stripped_of_special_tokens() {
    let (pipeline, _) = pipeline_with(1);
    let result = pipeline.answer("vaga Python").unwrap();
    assert_eq!(result.answer, "Perfil: Python, Django, SQL (256 tokens)");
}

#[test]
fn test_default_top_k_clamps_to_corpus_size() {
    let (pipeline, _) = pipeline_with(3);
    let result = pipeline.answer("vaga Java").unwrap();
    assert_eq!(result.context_texts(), vec!["Java, Spring", "Python, Django, SQL"]);
    assert!(result.retrieved[0].score >= result.retrieved[1].score);
}

#[test]
fn test_answer_many_preserves_order_and_matches_single_calls() {
    let (pipeline, _) = pipeline_with(1);
    let queries = vec!["vaga Java".to_string(), "vaga Python".to_string()];

    let batch = pipeline.answer_many(&queries).unwrap();
    assert_eq!(batch.len(), 2);

    for (query, item) in queries.iter().zip(&batch) {
        let single = pipeline.answer(query).unwrap();
        let item = item.as_ref().unwrap();
        assert_eq!(item.answer, single.answer);
        assert_eq!(item.retrieved, single.retrieved);
    }
    assert_eq!(
        batch[0].as_ref().unwrap().context_texts(),
        vec!["Java, Spring"]
    );
}

#[test]
fn test_answer_many_rejects_empty_batch() {
    let (pipeline, generator) = pipeline_with(1);
    let err = pipeline.answer_many(&[]).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(generator.prompts.lock().is_empty());
}

#[test]
fn test_answer_many_rejects_blank_query_before_any_work() {
    let (pipeline, generator) = pipeline_with(1);
    let queries = vec!["vaga Python".to_string(), "   ".to_string()];
    let err = pipeline.answer_many(&queries).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(generator.prompts.lock().is_empty());
}

#[test]
fn test_failures_are_isolated_per_item() {
    let (pipeline, _) = pipeline_with(1);
    let queries = vec![
        "vaga Python".to_string(),
        "vaga explode".to_string(),
        "vaga desconhecida".to_string(),
        "vaga Java".to_string(),
    ];

    let batch = pipeline.answer_many(&queries).unwrap();
    assert_eq!(batch.len(), 4);
    assert!(batch[0].is_ok());
    assert!(matches!(batch[1], Err(Error::GenerationFailure(_))));
    assert!(matches!(batch[2], Err(Error::Embedding(_))));
    assert!(batch[3].is_ok());
}

#[test]
fn test_single_query_errors_surface_directly() {
    let (pipeline, _) = pipeline_with(1);
    assert!(matches!(
        pipeline.answer("vaga explode"),
        Err(Error::GenerationFailure(_))
    ));
    assert!(matches!(pipeline.answer(""), Err(Error::InvalidInput(_))));
}

#[test]
fn test_request_limits_override_defaults() {
    let (pipeline, generator) = pipeline_with(3);
    let mut request = GenerationRequest::new("vaga Python", pipeline.settings());
    request.top_k = 2;
    // Budget of 6 whitespace tokens fits the query, header and first context only.
    request.max_model_tokens = 10;
    request.max_new_tokens = 4;

    let result = pipeline.answer_request(&request).unwrap();
    assert_eq!(result.retrieved.len(), 2);
    assert_eq!(
        generator.prompts.lock()[0],
        "vaga Python\nContexto:\nPython, Django, SQL"
    );
    assert_eq!(result.answer, "Perfil: Python, Django, SQL (4 tokens)");
}

#[test]
fn test_empty_corpus_fails_with_empty_index() {
    let pipeline = RagPipeline::new(
        Arc::new(CorpusIndex::empty(2)),
        Arc::new(FakeEncoder::new()),
        Arc::new(FakeGenerator::default()),
        Arc::new(WhitespaceTokenCounter),
        GenerationSettings::default(),
    )
    .unwrap();
    assert!(matches!(pipeline.answer("vaga Python"), Err(Error::EmptyIndex)));
}

#[test]
fn test_encoder_dimension_must_match_corpus() {
    let index = CorpusIndex::build(vec![vec![1.0, 0.0, 0.0]], vec!["x".into()]).unwrap();
    let result = RagPipeline::new(
        Arc::new(index),
        Arc::new(FakeEncoder::new()),
        Arc::new(FakeGenerator::default()),
        Arc::new(WhitespaceTokenCounter),
        GenerationSettings::default(),
    );
    assert!(matches!(
        result,
        Err(Error::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));
}
