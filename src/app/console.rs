//! Plain-terminal front end: listings, the quiz loop, the chat loop and reading

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use textwrap::{Options, wrap};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::command::{ChatInput, ParseResult, QuizInput, parse_chat_input, parse_quiz_input};
use super::{App, MaterialViewer};
use crate::catalog::{Category, Material};
use crate::claude::Role;
use crate::config::KeyValueStore;
use crate::progress::ProgressTier;
use crate::quiz::{Advanced, GenerationOutcome, QuizPhase};
use crate::search::{SubjectGroup, highlight};

/// Column width for wrapped text
pub const WIDTH: usize = 78;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn wrapped(text: &str, indent: &str) -> String {
    let options = Options::new(WIDTH).initial_indent(indent).subsequent_indent(indent);
    wrap(text, options).join("\n")
}

/// `text` with every occurrence of `query` in bold
pub fn emphasize(text: &str, query: &str) -> String {
    highlight(text, query)
        .iter()
        .map(|s| if s.is_match { format!("{}{}{}", BOLD, s.text, RESET) } else { s.text.to_string() })
        .collect()
}

fn progress_cell<S: KeyValueStore>(app: &App<S>, material_id: &str) -> String {
    match app.tracker().tier(material_id) {
        ProgressTier::NotStarted => String::new(),
        tier => format!("{:>3}% {}", app.progress(material_id), tier.label(app.language())),
    }
}

fn material_line<S: KeyValueStore>(app: &App<S>, material: &Material, query: &str) -> String {
    format!(
        "  {:<12} [{}] {}  {}",
        material.id,
        material.category.as_str(),
        emphasize(&material.title, query),
        progress_cell(app, &material.id)
    )
}

/// Print every subject with per-category counts and progress
pub fn print_subjects<S: KeyValueStore>(app: &App<S>, out: &mut impl Write) -> Result<()> {
    let language = app.language();

    for subject in app.catalog().subjects() {
        let summary = app.tracker().subject_summary(subject);
        writeln!(
            out,
            "{}{}{} ({}) {}/{} started, {} completed, {}% average",
            BOLD, subject.name, RESET, subject.id, summary.started, summary.total, summary.completed,
            summary.average
        )?;

        let counts: Vec<String> = Category::all()
            .iter()
            .filter_map(|&c| {
                let n = subject.count(c);
                (n > 0).then(|| format!("{} {}", n, c.label(language)))
            })
            .collect();
        writeln!(out, "  {}", counts.join(" · "))?;
    }

    Ok(())
}

/// Print one subject's materials
pub fn print_materials<S: KeyValueStore>(
    app: &App<S>,
    materials: &[&Material],
    query: &str,
    out: &mut impl Write,
) -> Result<()> {
    if materials.is_empty() {
        writeln!(out, "  (no materials)")?;
    }
    for material in materials {
        writeln!(out, "{}", material_line(app, material, query))?;
    }
    Ok(())
}

/// Print search results grouped under their subjects
pub fn print_search_groups<S: KeyValueStore>(
    app: &App<S>,
    groups: &[SubjectGroup<'_>],
    query: &str,
    out: &mut impl Write,
) -> Result<()> {
    if groups.is_empty() {
        writeln!(out, "No results for \"{}\"", query.trim())?;
        return Ok(());
    }

    for group in groups {
        writeln!(out, "{}", emphasize(&group.subject.name, query))?;
        for material in &group.materials {
            writeln!(out, "{}", material_line(app, material, query))?;
            if let Some(description) = &material.description {
                writeln!(out, "{}", wrapped(&emphasize(description, query), "      "))?;
            }
        }
    }

    Ok(())
}

/// Print where to view or download a material
pub fn print_locators(viewer: &MaterialViewer, out: &mut impl Write) -> Result<()> {
    let material = viewer.material();
    writeln!(out, "{}{}{}", BOLD, material.title, RESET)?;
    if let Some(description) = &material.description {
        writeln!(out, "{}", wrapped(description, "  "))?;
    }

    match material.video_id() {
        Some(id) => writeln!(out, "  Watch:    https://www.youtube.com/watch?v={}", id)?,
        None => {
            writeln!(out, "  View:     {}", material.viewer_url())?;
            writeln!(out, "  Download: {}", material.download_url())?;
        }
    }
    Ok(())
}

fn print_question(viewer: &MaterialViewer, out: &mut impl Write) -> Result<()> {
    let quiz = viewer.quiz();
    let Some(question) = quiz.current_question() else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "{}{}/{}{}", BOLD, quiz.index() + 1, quiz.len(), RESET)?;
    writeln!(out, "{}", wrapped(&question.prompt, ""))?;
    for (i, option) in question.options.iter().enumerate() {
        writeln!(out, "{}", wrapped(&format!("{}) {}", i + 1, option), "   "))?;
    }
    Ok(())
}

const QUIZ_HELP: &str = "1-4 or a-d: answer · Enter/n: next · r: restart · q: quit";

/// Run a quiz interactively, generating one first if the material has none
pub async fn run_quiz<S, R>(
    app: &mut App<S>,
    viewer: &mut MaterialViewer,
    input: &mut R,
    out: &mut impl Write,
) -> Result<()>
where
    S: KeyValueStore,
    R: AsyncBufRead + Unpin,
{
    if viewer.quiz().phase() == QuizPhase::NoQuiz {
        writeln!(out, "Generating a quiz for \"{}\"...", viewer.material().title)?;
        out.flush()?;

        match app.generate_quiz(viewer).await {
            Some(GenerationOutcome::Bound) => {}
            Some(GenerationOutcome::Placeholder(err)) => {
                writeln!(out, "{} Using a self-check quiz instead.", err.user_message())?;
            }
            Some(GenerationOutcome::Failed(err)) => {
                writeln!(out, "{}", err.user_message())?;
                return Ok(());
            }
            Some(GenerationOutcome::Stale) | None => return Ok(()),
        }
    }

    writeln!(out, "{}", QUIZ_HELP)?;
    viewer.quiz.start();
    print_question(viewer, out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let options = viewer.quiz().current_question().map_or(0, |q| q.options.len());

        match parse_quiz_input(&line, options) {
            ParseResult::Ok(QuizInput::Answer(option)) => {
                match app.select_answer(viewer, option) {
                    Some(outcome) if outcome.is_correct => writeln!(out, "Correct!")?,
                    Some(outcome) => {
                        writeln!(out, "Wrong. The answer was {}.", outcome.correct_index + 1)?
                    }
                    None => writeln!(out, "Already answered. Press Enter for the next question.")?,
                }
            }
            ParseResult::Ok(QuizInput::Next) => match app.advance_quiz(viewer) {
                Some(Advanced::Question(_)) => print_question(viewer, out)?,
                Some(Advanced::Finished { score, .. }) => {
                    writeln!(out)?;
                    writeln!(
                        out,
                        "{}{}{} Score {} ({}%)",
                        BOLD,
                        score.verdict().message(app.language()),
                        RESET,
                        score,
                        score.percentage()
                    )?;
                    writeln!(out, "Progress: {}%", app.progress(&viewer.material().id))?;
                    writeln!(out, "r: restart · q: quit")?;
                }
                None if viewer.quiz().phase() == QuizPhase::Finished => {
                    writeln!(out, "Quiz finished. r: restart · q: quit")?
                }
                None => writeln!(out, "Pick an answer first.")?,
            },
            ParseResult::Ok(QuizInput::Restart) => {
                app.restart_quiz(viewer);
                viewer.quiz.start();
                print_question(viewer, out)?;
            }
            ParseResult::Ok(QuizInput::Quit) => break,
            ParseResult::Ok(QuizInput::Help) => writeln!(out, "{}", QUIZ_HELP)?,
            ParseResult::UnknownCommand(cmd) => {
                writeln!(out, "Unknown input: {}. {}", cmd, QUIZ_HELP)?
            }
        }
    }

    Ok(())
}

const CHAT_HELP: &str = "Type a question · /clear: new conversation · /quit: leave";

/// Chat with the assistant until the input ends or the user quits
pub async fn run_chat<S, R>(app: &App<S>, input: &mut R, out: &mut impl Write) -> Result<()>
where
    S: KeyValueStore,
    R: AsyncBufRead + Unpin,
{
    let mut session = app.assistant();
    if let Some(greeting) = session.transcript().first() {
        writeln!(out, "{}", wrapped(&greeting.content, ""))?;
    }
    writeln!(out, "{}", CHAT_HELP)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_chat_input(&line) {
            ParseResult::Ok(ChatInput::Message(text)) => {
                let reply = app.ask(&mut session, &text).await?;
                debug_assert_eq!(reply.role, Role::Assistant);
                writeln!(out, "{}", wrapped(&reply.content, "  "))?;
            }
            ParseResult::Ok(ChatInput::Clear) => {
                session.clear();
                writeln!(out, "{}", wrapped(&session.transcript()[0].content, ""))?;
            }
            ParseResult::Ok(ChatInput::Quit) => break,
            ParseResult::Ok(ChatInput::Help) => writeln!(out, "{}", CHAT_HELP)?,
            ParseResult::Ok(ChatInput::Nop) => {}
            ParseResult::UnknownCommand(cmd) => {
                writeln!(out, "Unknown command: /{}. {}", cmd, CHAT_HELP)?
            }
        }
    }

    Ok(())
}

/// Track reading time until Ctrl-C, printing progress as it rises
pub async fn watch_reading<S: KeyValueStore>(
    app: &mut App<S>,
    viewer: &mut MaterialViewer,
    poll: Duration,
    out: &mut impl Write,
) -> Result<()> {
    if viewer.reading().is_none() {
        return Ok(());
    }

    writeln!(out, "Reading... press Ctrl-C when done.")?;
    let mut last = app.progress(&viewer.material().id);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(poll) => {
                let now = app.tick_reading(viewer);
                if now > last {
                    writeln!(out, "Progress: {}%", now)?;
                    last = now;
                }
                if viewer.reading().is_some_and(|t| t.is_saturated()) {
                    writeln!(out, "Reading complete. Take the quiz to finish this lesson.")?;
                    break;
                }
            }
        }
    }

    Ok(())
}
