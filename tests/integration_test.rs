// Integration tests for predx
use predx_core::{Embedding, VectorStore, WordVector};
use predx_engine::{trainer, Completer, CostWeights, SectionStats};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_store(rng: &mut StdRng) -> VectorStore {
    let mut store = VectorStore::new(8);
    for word in [
        "the", "cat", "sat", "on", "a", "mat", "dog", "ran", "fast", ".", "!",
    ] {
        store.add_random(word, rng).unwrap();
    }
    store
}

#[test]
fn test_store_search_pipeline() {
    let mut rng = StdRng::seed_from_u64(100);
    let mut store = seeded_store(&mut rng);

    // Exact retrieval round-trips the inserted embedding.
    let embedding = Embedding::new(vec![0.1; 8]);
    store
        .add(WordVector::new("exactly", embedding.clone()), true)
        .unwrap();
    assert_eq!(
        store.exact("exactly").unwrap().embedding.as_slice(),
        embedding.as_slice()
    );

    // Approximate search agrees with the exhaustive scan once built.
    store.build_ann_index(8, &mut rng).unwrap();
    let query = store.exact("cat").unwrap().embedding.clone();
    let exhaustive = store.nearest(&query, 1, None).unwrap();
    let approximate = store.nearest_approx(&query, 1, None).unwrap();
    assert_eq!(exhaustive[0].word.word, approximate[0].word.word);
}

#[test]
fn test_tokenize_predict_and_accumulate() {
    let mut rng = StdRng::seed_from_u64(101);
    let store = seeded_store(&mut rng);

    let mut completer = Completer::new(store, 12, 10).unwrap();
    completer.partition_into_subdatabases().unwrap();

    let text = "the cat sat on a mat. the dog ran fast!";
    let tokens = completer.tokenize(text);
    assert!(tokens.len() >= 10);

    let stats = SectionStats::from_section(text, &tokens);
    for token in &tokens {
        let prediction = completer.predict_next_token(token, &stats).unwrap();
        assert_eq!(prediction.predicted_embedding.dim(), 8);
        assert!(prediction.kind_scores.iter().all(|s| s.is_finite()));
    }

    // Section boundary: context absorbs the section, ephemeral resets.
    let context = completer
        .accumulate_context(
            stats.sentence_length_mean,
            stats.sentence_length_stddev,
            stats.flesch_kincaid_grade,
        )
        .unwrap();
    assert_eq!(context.len(), 10);
    assert!(completer.ephemeral_memory().iter().all(|v| *v == 0.0));
}

#[test]
fn test_train_step_and_apply_end_to_end() {
    let mut rng = StdRng::seed_from_u64(102);
    let store = seeded_store(&mut rng);

    let mut completer = Completer::new(store, 8, 8).unwrap();
    completer.partition_into_subdatabases().unwrap();

    let sections = vec![
        "the cat sat on a mat.".to_string(),
        "the dog ran fast!".to_string(),
    ];
    let weights = CostWeights::default();

    let modification =
        trainer::train_step(&completer, &sections, &weights, 4, &mut rng).unwrap();
    assert!(modification.cost_after <= modification.cost_before);

    if modification.improves() {
        trainer::apply(&mut completer, &modification).unwrap();
        let mut check = completer.clone();
        let cost = trainer::corpus_cost(&mut check, &sections, &weights).unwrap();
        assert!(cost.is_finite());
    }
}

#[test]
fn test_save_load_predict_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");

    let mut rng = StdRng::seed_from_u64(103);
    let mut store = seeded_store(&mut rng);
    store.build_ann_index(4, &mut rng).unwrap();

    let mut completer = Completer::new(store, 6, 6).unwrap();
    completer.partition_into_subdatabases().unwrap();

    let text = "the cat sat.";
    let tokens = completer.tokenize(text);
    let stats = SectionStats::from_section(text, &tokens);
    let before = completer.predict_next_token(&tokens[0], &stats).unwrap();

    predx_storage::save_completer(&completer, &path).unwrap();
    let mut restored = predx_storage::load_completer(&path).unwrap();

    // The restored completer carries the committed ephemeral memory, so the
    // same next prediction matches.
    let expected = completer.predict_next_token(&tokens[1], &stats).unwrap();
    let actual = restored.predict_next_token(&tokens[1], &stats).unwrap();
    assert_eq!(
        expected.predicted_embedding.as_slice(),
        actual.predicted_embedding.as_slice()
    );
    assert!(!before.resolved.improvised);
}
