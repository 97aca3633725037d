//! A terminal front end that researches questions and summarizes pages.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use sleuth::settings::Settings;
use sleuth::{Input, Session, SessionBuilder, render};
use sleuth_core::{ArticleAnalysis, Error, Phase, ResearchResult, Snapshot};
use sleuth_firecrawl::{FirecrawlConfigBuilder, FirecrawlFetcher};
use sleuth_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum Outcome {
    Research(Result<ResearchResult, Error>),
    Article(Result<ArticleAnalysis, Error>),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("loaded settings: {settings:?}");

    let (session, mut snapshot_rx) = build_session(settings);

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let input = Input::parse(&line);
        if input == Input::Empty {
            continue;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message(match input {
            Input::Analyze(_) => "📄 Reading the page...",
            _ => "🤔 Planning the search...",
        });

        let run = async {
            match input {
                Input::Analyze(url) => Outcome::Article(session.analyze(url).await),
                Input::Research(text) => {
                    Outcome::Research(session.research(text).await)
                }
                Input::Empty => unreachable!(),
            }
        };
        tokio::pin!(run);

        let outcome = loop {
            progress_bar.inc(1);
            select! {
                outcome = &mut run => break outcome,
                snapshot = snapshot_rx.recv() => {
                    if let Some(snapshot) = snapshot {
                        show_snapshot(&progress_bar, &snapshot);
                    }
                }
                _ = sleep(Duration::from_millis(100)) => {}
            }
        };

        // Snapshots sent right before completion may still be queued.
        while let Ok(snapshot) = snapshot_rx.try_recv() {
            show_snapshot(&progress_bar, &snapshot);
        }
        progress_bar.finish_and_clear();

        match outcome {
            Outcome::Research(Ok(result)) => print!("{}", render::result(&result)),
            Outcome::Article(Ok(analysis)) => {
                print!("{}", render::article(&analysis))
            }
            Outcome::Research(Err(err)) | Outcome::Article(Err(err)) => {
                println!("{}{}", render::BAR_CHAR.red(), err.red());
            }
        }
        println!();
    }
}

fn build_session(
    settings: Settings,
) -> (Session, mpsc::UnboundedReceiver<Snapshot>) {
    let mut openai = OpenAIConfigBuilder::with_api_key(settings.openai_api_key);
    if let Some(base_url) = settings.openai_base_url {
        openai = openai.with_base_url(base_url);
    }
    if let Some(model) = settings.openai_model {
        openai = openai.with_model(model);
    }

    let mut firecrawl =
        FirecrawlConfigBuilder::with_api_key(settings.firecrawl_api_key);
    if let Some(base_url) = settings.firecrawl_base_url {
        firecrawl = firecrawl.with_base_url(base_url);
    }

    let (reporter, snapshot_rx) = sleuth_core::snapshot::channel();
    let mut builder = SessionBuilder::new(
        OpenAIProvider::new(openai.build()),
        FirecrawlFetcher::new(firecrawl.build()),
    )
    .with_limit(settings.source_limit)
    .with_max_iterations(settings.max_iterations)
    .with_confidence_threshold(settings.confidence_threshold)
    .with_reporter(reporter);
    if let Some(routing_table) = settings.routing_table {
        builder = builder.with_routing_table(routing_table);
    }
    if let Some(deadline) = settings.deadline {
        builder = builder.with_deadline(deadline);
    }
    (builder.build(), snapshot_rx)
}

fn show_snapshot(progress_bar: &ProgressBar, snapshot: &Snapshot) {
    if snapshot.phase == Phase::IterationDone {
        if let Some(iteration) = snapshot.iterations.last() {
            let index = snapshot.iterations.len() - 1;
            progress_bar.suspend(|| {
                print!("{}", render::iteration(index, iteration));
            });
        }
    }
    progress_bar.set_message(render::phase_message(snapshot));
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
