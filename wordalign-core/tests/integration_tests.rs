//! End-to-end training, persistence and warm-start tests.

use wordalign_core::*;

fn pair(source: &str, target: &str) -> SentencePair {
    SentencePair::new(source.split_whitespace(), target.split_whitespace())
}

fn toy_corpus() -> Vec<SentencePair> {
    vec![
        pair("le chat", "the cat"),
        pair("le chien", "the dog"),
        pair("un chat", "a cat"),
        pair("un chien", "a dog"),
        pair("le chat noir", "the black cat"),
        pair("un chien noir", "a black dog"),
    ]
}

#[test]
fn model1_aligns_toy_corpus() {
    let corpus = toy_corpus();
    let model = Model1Trainer::default().train(&corpus).unwrap();
    let lex = model.lexical();
    assert!(lex.prob(Some("chat"), "cat") > lex.prob(Some("chat"), "the"));
    assert!(lex.prob(Some("le"), "the") > lex.prob(Some("le"), "cat"));

    let a = model.align(&pair("le chien", "the dog"));
    assert_eq!(a.pairs().collect::<Vec<_>>(), vec![(0, 0), (1, 1)]);
}

#[test]
fn model1_output_warm_starts_model2_through_a_file() {
    let corpus = toy_corpus();
    let m1 = Model1Trainer::default().train(&corpus).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model1.json");
    save_lexical(m1.lexical(), &path).unwrap();

    let trainer = Model2Trainer::default().with_warm_start_file(&path).unwrap();
    let warm = trainer.warm_start().unwrap();
    assert_eq!(warm.table().len(), m1.lexical().table().len());
    for (s, t, p) in m1.lexical().entries() {
        assert_eq!(warm.prob(s, t), p);
    }

    let m2 = trainer.train(&corpus).unwrap();
    assert!(m2.summary().iterations >= 1);
    let a = m2.align(&pair("le chat", "the cat"));
    assert_eq!(a.source_for(0), Some(0));
    assert_eq!(a.source_for(1), Some(1));
}

#[test]
fn corrupt_warm_start_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"{\"entries\": [").unwrap();
    let err = Model2Trainer::default().with_warm_start_file(&path).unwrap_err();
    match err {
        AlignError::WarmStartUnavailable { path: p, .. } => assert_eq!(p, path),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn moses_output_of_trained_model() {
    let corpus = toy_corpus();
    let model = Model1Trainer::default().train(&corpus).unwrap();
    let out = write_moses(&model.align_all(&corpus[..2]));
    assert_eq!(out, "0-0 1-1\n0-0 1-1\n");
}

#[test]
fn plaintext_corpus_trains() {
    let pairs = parse_plaintext("le chat\nun chien\n", "the cat\na dog\n").unwrap();
    let model = Model2Trainer::new(TrainOptions::model2().with_max_iterations(5))
        .train(&pairs)
        .unwrap();
    assert!(model.summary().iterations <= 5);
}

#[test]
fn invalid_ratio_is_rejected_before_training() {
    let err = Model1Trainer::new(TrainOptions::model1().with_improvement_ratio(0.9))
        .train(&toy_corpus())
        .unwrap_err();
    assert!(matches!(err, AlignError::InvalidConfig(_)));
}
