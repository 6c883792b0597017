//! Interactive `watch` session.

use anyhow::Context;
use inquire::{InquireError, Text};
use tracing::debug;

use weatherview_core::WeatherView;

use crate::render;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Search(String),
    /// Zero-based history index.
    Select(usize),
    ToggleDark,
    Refresh,
    Quit,
}

/// Interpret one line typed at the prompt.
///
/// A bare number picks that (1-based) history entry when it exists;
/// anything else that is not a command is a city name.
pub fn parse_input(line: &str, history_len: usize) -> Input {
    let line = line.trim();
    match line {
        "" => Input::Refresh,
        ":q" | ":quit" => Input::Quit,
        ":dark" | ":light" => Input::ToggleDark,
        _ => match line.parse::<usize>() {
            Ok(n) if (1..=history_len).contains(&n) => Input::Select(n - 1),
            _ => Input::Search(line.to_string()),
        },
    }
}

pub async fn run(mut view: WeatherView, dark: bool) -> anyhow::Result<()> {
    if dark {
        view.toggle_dark_mode();
    }
    view.start_clock();
    view.initialize();
    view.settle().await;

    loop {
        view.pump();
        println!("{}", render::render(&view.view_model()));

        let Some(line) = prompt().await? else {
            break;
        };

        let input = parse_input(&line, view.state().history.len());
        debug!(?input, "session input");
        match input {
            Input::Quit => break,
            Input::ToggleDark => {
                view.toggle_dark_mode();
            }
            Input::Select(index) => {
                view.select_history(index);
            }
            Input::Search(city) => {
                view.load_by_name(&city);
            }
            Input::Refresh => {}
        }
        view.settle().await;
    }

    view.stop_clock();
    Ok(())
}

// inquire blocks, so the prompt runs off the async workers; the clock keeps ticking.
async fn prompt() -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| {
        Text::new("Enter Location:")
            .with_help_message("1-5 reselects a recent search, :dark toggles theme, :q quits")
            .prompt()
    })
    .await
    .context("Prompt task failed")?;

    match answer {
        Ok(line) => Ok(Some(line)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e).context("Failed to read input"),
    }
}
