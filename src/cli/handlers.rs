use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;

use crate::{
    activities::{self, ActivityCreate, ActivityStore},
    activity_input,
    app::AppFactory,
    config::Config,
    errors::AppError,
    focus_prompt::FocusPrompt,
    suggestions::{EngineState, SuggestionEngine},
};

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn handle_parse(text: Vec<String>) -> Result<()> {
    let parsed = activity_input::parse(&text.join(" "));
    print_json(&parsed)
}

pub fn handle_log(
    text: Vec<String>,
    duration: Option<u32>,
    ask_focus: bool,
    store: Arc<dyn ActivityStore>,
    focus_prompt: FocusPrompt,
) -> Result<()> {
    let parsed = activity_input::parse(&text.join(" "));

    let create = ActivityCreate {
        duration_minutes: duration,
        ..ActivityCreate::from_parsed(&parsed)
    };

    let mut activity = store.create(create)?;

    if ask_focus {
        focus_prompt.request(activity.id);

        loop {
            let answer = inquire::Text::new("How focused were you? (1-5)")
                .with_help_message("Esc to skip")
                .prompt_skippable()
                .context("Failed to read focus rating")?;

            let Some(answer) = answer else {
                focus_prompt.dismiss();
                break;
            };

            let Ok(rating) = answer.trim().parse::<u8>() else {
                println!("Please type a number");
                continue;
            };

            match focus_prompt.submit(rating) {
                Ok((id, rating)) => {
                    activity = store.set_focus_rating(id, rating)?;
                    break;
                }
                Err(AppError::InvalidFocusRating(_)) => {
                    println!("Rating must be between 1 and 5");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    print_json(&activity)
}

async fn run_search(engine: &SuggestionEngine, query: &str) -> Result<EngineState> {
    if query.is_empty() {
        engine.get_initial_suggestions();
    } else {
        engine.set_query(query);
    }

    let state = engine.settle().await;

    if let Some(err) = state.error.clone() {
        bail!(err);
    }

    Ok(state)
}

pub async fn handle_suggest(
    query: Option<String>,
    remote: Option<String>,
    next: usize,
    config: &Config,
    store: Arc<dyn ActivityStore>,
) -> Result<()> {
    let source = AppFactory::create_source(remote, config, store)?;
    let engine = SuggestionEngine::new(source, config.suggestions.engine_config());

    let query = query.unwrap_or_default();
    run_search(&engine, &query).await?;

    for _ in 0..next {
        engine.select_next();
    }

    let state = engine.state();
    print_json(&json!({
        "query": state.query,
        "activities": state.activity_suggestions(),
        "tags": state.tag_suggestions(),
        "selected": state.selected_suggestion(),
    }))
}

/// What to search for while `input` is being typed: the trailing `#tag`
/// token if there is one, otherwise the text without markers.
pub fn completion_query(input: &str) -> String {
    if input.ends_with(char::is_whitespace) {
        return activity_input::clean_text(input);
    }

    match input.split_whitespace().last() {
        Some(token) if token.starts_with('#') => token.to_string(),
        _ => activity_input::clean_text(input),
    }
}

pub async fn handle_complete(
    text: Vec<String>,
    pick: usize,
    remote: Option<String>,
    config: &Config,
    store: Arc<dyn ActivityStore>,
) -> Result<()> {
    let input = text.join(" ");

    let source = AppFactory::create_source(remote, config, store)?;
    let engine = SuggestionEngine::new(source, config.suggestions.engine_config());

    run_search(&engine, &completion_query(&input)).await?;

    if !engine.select_index(pick) {
        log::warn!(
            "no suggestion #{pick}, {} available",
            engine.suggestions().len()
        );
        println!("{input}");
        return Ok(());
    }

    match engine.select_current() {
        Some(suggestion) => println!("{}", activity_input::apply_suggestion(&input, &suggestion)),
        None => println!("{input}"),
    }

    engine.cleanup();
    Ok(())
}

pub fn handle_tags(store: Arc<dyn ActivityStore>) -> Result<()> {
    let list = store.list()?;

    let counts = activities::tag_counts(&list)
        .into_iter()
        .map(|(tag, count)| json!({ "tag": tag, "count": count }))
        .collect::<Vec<_>>();

    print_json(&counts)
}
