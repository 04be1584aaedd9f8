//! Questions answered end to end against the SQLite fixture

mod common;

use anyhow::Result;
use common::{context, tokens};
use serde_json::json;
use trail_core::{ask, ErrorKind, Question, QuestionError, StorageError};

#[tokio::test]
async fn test_attribute_of_every_record() -> Result<()> {
    let ctx = context().await?;
    let answer = ask(&ctx, &tokens(r#"["labor", "name"]"#)).await?;
    assert_eq!(answer, json!(["Nemean Lion", "Lernaean Hydra", "Ceryneian Hind", "Augean Stables"]));
    Ok(())
}

#[tokio::test]
async fn test_one_to_many_traversal() -> Result<()> {
    let ctx = context().await?;
    let answer = ask(&ctx, &tokens(r#"["labor", "monster", "name"]"#)).await?;
    assert_eq!(answer, json!([["Nemean Lion"], ["Hydra", "Karkinos"], ["Hind"], []]));
    Ok(())
}

#[tokio::test]
async fn test_parent_traversal() -> Result<()> {
    let ctx = context().await?;
    let answer = ask(&ctx, &tokens(r#"["monster", "labor", "name"]"#)).await?;
    assert_eq!(answer, json!(["Nemean Lion", "Lernaean Hydra", "Lernaean Hydra", "Ceryneian Hind"]));
    Ok(())
}

#[tokio::test]
async fn test_link_traversal() -> Result<()> {
    let ctx = context().await?;
    let answer = ask(&ctx, &tokens(r#"["labor", 2, "hero", "name"]"#)).await?;
    assert_eq!(answer, json!([["Heracles", "Iolaus"]]));
    Ok(())
}

#[tokio::test]
async fn test_filtered_terminal() -> Result<()> {
    let ctx = context().await?;
    let answer = ask(&ctx, &tokens(r#"["labor", "number", "::gt", 2]"#)).await?;
    assert_eq!(answer, json!([3, 5]));

    let answer = ask(&ctx, &tokens(r#"["labor", "number", "::between", 2, 3]"#)).await?;
    assert_eq!(answer, json!([2, 3]));
    Ok(())
}

#[tokio::test]
async fn test_sub_spec_filters_records() -> Result<()> {
    let ctx = context().await?;
    let answer = ask(&ctx, &tokens(r#"["labor", ["monster", "name", "::starts_with", "Hy"], "name"]"#)).await?;
    assert_eq!(answer, json!(["Lernaean Hydra"]));

    let answer = ask(&ctx, &tokens(r#"["labor", ["started", "::after", "2024-02-01"], "name"]"#)).await?;
    assert_eq!(answer, json!(["Lernaean Hydra", "Augean Stables"]));

    let answer = ask(&ctx, &tokens(r#"["hero", ["mortal", "::equals", false], "name"]"#)).await?;
    assert_eq!(answer, json!(["Athena"]));
    Ok(())
}

#[tokio::test]
async fn test_repeated_sub_spec_compiles_once() -> Result<()> {
    let ctx = context().await?;
    let once = Question::new(&ctx, &tokens(r#"["labor", ["number", "::gt", 1], "name"]"#))?;
    let twice = Question::new(&ctx, &tokens(r#"["labor", ["number", "::gt", 1], ["number", "::gt", 1], "name"]"#))?;
    assert_eq!(once.query(), twice.query());
    assert_eq!(twice.answer().await?, json!(["Lernaean Hydra", "Ceryneian Hind", "Augean Stables"]));
    Ok(())
}

#[tokio::test]
async fn test_condition_on_related_rows() -> Result<()> {
    let ctx = context().await?;
    // WHERE narrows the joined rows, so only labors with a matching monster remain
    let answer = ask(&ctx, &tokens(r#"["labor", "monster", ["heads", "::gt", 1], "name"]"#)).await?;
    assert_eq!(answer, json!([["Hydra"]]));
    Ok(())
}

#[tokio::test]
async fn test_returning_to_a_table_lists_all_its_records() -> Result<()> {
    let ctx = context().await?;
    let answer = ask(&ctx, &tokens(r#"["monster", "labor", "monster", "name"]"#)).await?;
    assert_eq!(answer, json!([["Nemean Lion"], ["Hydra", "Karkinos"], ["Hydra", "Karkinos"], ["Hind"]]));

    let answer = ask(&ctx, &tokens(r#"["labor", 2, "hero", "labor", "name"]"#)).await?;
    assert_eq!(answer, json!([[["Nemean Lion", "Lernaean Hydra", "Ceryneian Hind"], ["Lernaean Hydra"]]]));
    Ok(())
}

#[tokio::test]
async fn test_sub_spec_keeps_later_traversal_whole() -> Result<()> {
    let ctx = context().await?;
    let answer = ask(&ctx, &tokens(r#"["labor", ["monster", "name", "::equals", "Hydra"], "monster", "name"]"#)).await?;
    assert_eq!(answer, json!([["Hydra", "Karkinos"]]));
    Ok(())
}

#[tokio::test]
async fn test_same_condition_through_two_sub_specs() -> Result<()> {
    let ctx = context().await?;
    let question = Question::new(
        &ctx,
        &tokens(r#"["labor", ["monster", "heads", "::gt", 1], ["monster", "heads", "::gt", 1], "monster", "name"]"#),
    )?;
    assert_eq!(question.query().filters.len(), 1);
    // one join for the conditions, one for the traversal
    assert_eq!(question.query().joins.len(), 2);
    assert_eq!(question.answer().await?, json!([["Hydra", "Karkinos"]]));
    Ok(())
}

#[tokio::test]
async fn test_datetime_filters_read_every_stored_format() -> Result<()> {
    let ctx = context().await?;
    // stored as '2024-04-01 00:00:00'
    let answer = ask(&ctx, &tokens(r#"["labor", "started", "::equals", "2024-04-01T00:00:00Z"]"#)).await?;
    assert_eq!(answer, json!(["2024-04-01T00:00:00Z"]));

    // stored as '2024-02-10T14:30:00+02:00'
    let window = r#"["labor", ["started", "::between", "2024-02-10T12:00:00Z", "2024-02-10T13:00:00Z"], "name"]"#;
    assert_eq!(ask(&ctx, &tokens(window)).await?, json!(["Lernaean Hydra"]));

    let answer = ask(&ctx, &tokens(r#"["labor", ["started", "::before", "2024-03-01"], "name"]"#)).await?;
    assert_eq!(answer, json!(["Nemean Lion", "Lernaean Hydra"]));
    Ok(())
}

#[tokio::test]
async fn test_typed_projections() -> Result<()> {
    let ctx = context().await?;
    assert_eq!(
        ask(&ctx, &tokens(r#"["labor", "started"]"#)).await?,
        json!(["2024-01-05T09:00:00Z", "2024-02-10T12:30:00Z", null, "2024-04-01T00:00:00Z"])
    );
    assert_eq!(ask(&ctx, &tokens(r#"["hero", "mortal"]"#)).await?, json!([true, true, false]));
    assert_eq!(
        ask(&ctx, &tokens(r#"["labor", 1, "scroll"]"#)).await?,
        json!([{ "key": "scrolls/lion.pdf", "url": "/files/scrolls/lion.pdf" }])
    );
    Ok(())
}

#[tokio::test]
async fn test_no_matches_is_empty() -> Result<()> {
    let ctx = context().await?;
    assert_eq!(ask(&ctx, &tokens(r#"["labor", ["number", "::gt", 100], "name"]"#)).await?, json!([]));
    assert_eq!(ask(&ctx, &tokens(r#"["labor", 99, "monster", "name"]"#)).await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_missing_table_is_a_storage_error() -> Result<()> {
    let ctx = context().await?;
    match ask(&ctx, &tokens(r#"["dragon", "name"]"#)).await {
        Err(QuestionError::Storage(StorageError::TableNotFound(table))) => assert_eq!(table, "dragon"),
        other => panic!("expected a missing table, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_compile_errors() -> Result<()> {
    let ctx = context().await?;
    let cases = [
        (r#"["labor", "name", "::equals"]"#, ErrorKind::MissingArgument),
        (r#"["labor", "number", "::gt", 5, "extra"]"#, ErrorKind::TrailingArguments),
        (r#"["labor", "species"]"#, ErrorKind::InvalidArgument),
    ];
    for (question, kind) in cases {
        let err = ask(&ctx, &tokens(question)).await.unwrap_err();
        assert_eq!(err.report().kind, kind, "{}", question);
    }
    Ok(())
}

#[tokio::test]
async fn test_concurrent_questions_share_the_pool() -> Result<()> {
    let ctx = context().await?;
    let names = tokens(r#"["labor", "name"]"#);
    let heroes = tokens(r#"["labor", "hero", "name"]"#);
    let (names, heroes) = tokio::join!(ask(&ctx, &names), ask(&ctx, &heroes));
    assert_eq!(names?.as_array().map(Vec::len), Some(4));
    assert_eq!(heroes?, json!([["Heracles"], ["Heracles", "Iolaus"], ["Heracles"], []]));
    Ok(())
}
