mod common;

use common::{init_tracing, pool_of, MODEL_A, MODEL_B};
use post_generator::mock::{
    chatty_reply, new_call_log, new_timeline, sample_content, ConcurrencyProbe, ScriptedModel, Span,
};
use post_generator::{BatchGenerator, GenerationStrategy, TextGenerator};
use std::time::{Duration, Instant};

fn batch(clients: Vec<ScriptedModel>, models: &[&str], chunk_delay: Duration) -> BatchGenerator {
    let strategy = GenerationStrategy::new(
        pool_of(clients),
        models.iter().map(|m| m.to_string()).collect(),
        TextGenerator::new("English"),
    )
    .expect("strategy builds");
    BatchGenerator::new(strategy, chunk_delay)
}

fn categories(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_runs_in_chunks_of_max_concurrent() {
    init_tracing();

    let probe = ConcurrencyProbe::new();
    let log = new_call_log();
    let client = ScriptedModel::new("key-0")
        .with_reply(MODEL_A, chatty_reply(&sample_content("Chunked")))
        .with_delay(Duration::from_millis(50))
        .with_probe(probe.clone())
        .with_log(log.clone());

    let outcomes = batch(vec![client], &[MODEL_A], Duration::ZERO)
        .generate_many(&categories(&["a", "b", "c", "d"]), 2)
        .await;

    assert_eq!(outcomes.len(), 4);
    assert_eq!(
        outcomes.iter().map(|o| o.category.as_str()).collect::<Vec<_>>(),
        vec!["a", "b", "c", "d"]
    );
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert_eq!(probe.peak(), 2, "never more than one chunk in flight");
    assert_eq!(log.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_next_chunk_waits_for_the_slowest_member() {
    init_tracing();

    let timeline = new_timeline();
    let client = ScriptedModel::new("key-0")
        .with_reply(MODEL_A, chatty_reply(&sample_content("Barrier")))
        .with_category_delay("slow", Duration::from_millis(200))
        .with_category_delay("fast", Duration::from_millis(5))
        .with_category_delay("third", Duration::from_millis(5))
        .with_category_delay("fourth", Duration::from_millis(5))
        .with_timeline(timeline.clone());

    let outcomes = batch(vec![client], &[MODEL_A], Duration::ZERO)
        .generate_many(&categories(&["slow", "fast", "third", "fourth"]), 2)
        .await;
    assert!(outcomes.iter().all(|o| o.is_success()));

    let events = timeline.lock().unwrap().clone();
    let position = |span: Span, category: &str| {
        events
            .iter()
            .position(|(s, c)| *s == span && c == category)
            .unwrap_or_else(|| panic!("no {:?} event for {}", span, category))
    };

    let slow_done = position(Span::End, "slow");
    assert!(position(Span::End, "fast") < slow_done);
    assert!(slow_done < position(Span::Start, "third"), "third started before the first chunk settled");
    assert!(slow_done < position(Span::Start, "fourth"), "fourth started before the first chunk settled");
    // both members of the second chunk are in flight together
    assert!(position(Span::Start, "fourth") < position(Span::End, "third"));
}

#[tokio::test]
async fn test_failures_are_tagged_per_category() {
    init_tracing();

    let client = ScriptedModel::new("key-0")
        .with_reply(MODEL_A, chatty_reply(&sample_content("Fine")))
        .failing_category("gamma", "blocked by safety filter");

    let outcomes = batch(vec![client], &[MODEL_A, MODEL_B], Duration::ZERO)
        .generate_many(&categories(&["alpha", "beta", "gamma", "delta"]), 3)
        .await;

    assert_eq!(outcomes.len(), 4);
    for outcome in &outcomes {
        if outcome.category == "gamma" {
            assert!(outcome.content.is_none());
            let error = outcome.error.as_deref().expect("failure carries an error");
            assert!(error.contains("blocked by safety filter"));
        } else {
            assert!(outcome.is_success(), "{} should succeed", outcome.category);
            assert!(outcome.error.is_none());
        }
    }
}

#[tokio::test]
async fn test_pauses_between_chunks() {
    init_tracing();

    let client = ScriptedModel::new("key-0").with_reply(MODEL_A, chatty_reply(&sample_content("Paced")));
    let started = Instant::now();

    let outcomes = batch(vec![client], &[MODEL_A], Duration::from_millis(100))
        .generate_many(&categories(&["a", "b", "c"]), 1)
        .await;

    assert_eq!(outcomes.len(), 3);
    // two gaps between three chunks
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_zero_concurrency_still_makes_progress() {
    init_tracing();

    let client = ScriptedModel::new("key-0").with_reply(MODEL_A, chatty_reply(&sample_content("Serial")));

    let outcomes = batch(vec![client], &[MODEL_A], Duration::ZERO)
        .generate_many(&categories(&["a", "b"]), 0)
        .await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_success()));
}

#[tokio::test]
async fn test_empty_batch_returns_nothing() {
    let client = ScriptedModel::new("key-0");
    let outcomes = batch(vec![client], &[MODEL_A], Duration::ZERO).generate_many(&[], 4).await;
    assert!(outcomes.is_empty());
}
