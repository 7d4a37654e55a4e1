mod common;

use common::{init_tracing, MODEL_A};
use post_generator::mock::{chatty_reply, sample_content, ScriptedModel};
use post_generator::{GeneratorError, Grounding, Result, TextGenerator};

#[tokio::test]
async fn test_same_inputs_give_equal_records() -> Result<()> {
    init_tracing();

    let client = ScriptedModel::new("key-0").with_reply(MODEL_A, chatty_reply(&sample_content("Ownership")));
    let generator = TextGenerator::new("English");

    let first = generator.generate(&client, MODEL_A, "rust").await?;
    let second = generator.generate(&client, MODEL_A, "rust").await?;

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_sends_category_prompt_without_grounding() -> Result<()> {
    init_tracing();

    let client = ScriptedModel::new("key-0").with_reply(MODEL_A, chatty_reply(&sample_content("Lifetimes")));
    TextGenerator::new("English").generate(&client, MODEL_A, "rust").await?;

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, MODEL_A);
    assert_eq!(calls[0].grounding, Grounding::None);
    Ok(())
}

#[tokio::test]
async fn test_provider_and_parse_failures_both_surface_as_errors() {
    init_tracing();

    let client = ScriptedModel::new("key-0")
        .with_failure(MODEL_A, "503 overloaded")
        .with_reply("chatty", "Here you go: no json today");
    let generator = TextGenerator::new("English");

    let provider_err = generator.generate(&client, MODEL_A, "rust").await.unwrap_err();
    assert!(matches!(provider_err, GeneratorError::Provider { .. }));

    let parse_err = generator.generate(&client, "chatty", "rust").await.unwrap_err();
    assert!(matches!(parse_err, GeneratorError::Parse(_)));

    assert!(provider_err.is_attempt_failure() && parse_err.is_attempt_failure());
}
