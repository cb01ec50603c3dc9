//! Interactive terminal commands: `new` and `heatmaps`.

use std::io::{self, BufRead, Write};

use chrono::{Datelike, Local, NaiveDate};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::category::{Appetite, Category, Confidence, Emotion};
use crate::models::diary::{DiaryDraft, WriteMode};
use crate::services::calendar::EventSource;
use crate::services::heatmap::{FieldStatus, HeatmapGenerator};
use crate::services::record_store::RecordStore;

/// Line-oriented question/answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    pub fn ask(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        Ok(self.read_line()?.unwrap_or_default().trim().to_string())
    }

    /// y/n question, repeated until answered. End of input counts as no.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        loop {
            write!(self.output, "{prompt} (y/n): ")?;
            self.output.flush()?;
            let Some(answer) = self.read_line()? else {
                return Ok(false);
            };
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer y or n.")?,
            }
        }
    }

    /// Numbered menu over the whole domain of `C`; Enter picks the first.
    pub fn choose<C: Category>(&mut self, title: &str) -> io::Result<C> {
        self.say(title)?;
        for (i, value) in C::ALL.iter().enumerate() {
            let mark = if i == 0 { " (default)" } else { "" };
            writeln!(self.output, "  {}. {}{}", i + 1, value.label(), mark)?;
        }
        loop {
            write!(self.output, "Choice (Enter for 1): ")?;
            self.output.flush()?;
            let Some(answer) = self.read_line()? else {
                return Ok(C::ALL[0]);
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(C::ALL[0]);
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=C::ALL.len()).contains(&n) => return Ok(C::ALL[n - 1]),
                _ => self.say("Please enter a number from the list.")?,
            }
        }
    }

    /// Free text ending at the first blank line (or end of input).
    pub fn ask_text(&mut self, prompt: &str) -> io::Result<String> {
        self.say(prompt)?;
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

/// Creates the entry for `date` interactively.
pub async fn run_new<R: BufRead, W: Write>(
    config: &Config,
    events: &EventSource,
    date: NaiveDate,
    prompter: &mut Prompter<R, W>,
) -> AppResult<()> {
    let store = RecordStore::open(&config.base_dir)?;

    let mut mode = WriteMode::CreateNew;
    if store.exists(date) {
        let name = RecordStore::file_name(date);
        if !prompter.confirm(&format!("{name} already exists. Overwrite?"))? {
            prompter.say("Cancelled.")?;
            return Ok(());
        }
        mode = WriteMode::Overwrite;
    }

    let location = prompter.ask(&format!(
        "Location (Enter for '{}'): ",
        config.default_location
    ))?;
    let emotion = prompter.choose::<Emotion>("Emotion:")?;
    let appetite = prompter.choose::<Appetite>("Appetite:")?;
    let confidence = prompter.choose::<Confidence>("Confidence:")?;
    let journal = prompter.ask_text("Journal (blank line to finish):")?;
    let exercise = prompter.ask_text("Exercise (blank line to finish):")?;

    let now = Local::now().naive_local();
    let draft = DiaryDraft {
        date,
        recorded_at: (date == now.date()).then_some(now),
        location: Some(location),
        emotion: Some(emotion),
        appetite: Some(appetite),
        confidence: Some(confidence),
        events: events.events_or_empty().await,
        journal,
        exercise,
    };
    let (meta, content) = draft.compose(&config.default_location);
    let path = store.write(date, &meta, &content, mode)?;
    prompter.say(&format!("Saved {}", path.display()))?;

    if prompter.confirm("Generate yearly heatmaps into the heatmaps folder?")? {
        generate_and_report(config, date.year(), prompter)?;
    }
    Ok(())
}

/// Renders all three heatmaps for `year` and prints one line per field.
pub fn generate_and_report<R: BufRead, W: Write>(
    config: &Config,
    year: i32,
    prompter: &mut Prompter<R, W>,
) -> AppResult<()> {
    let generator = HeatmapGenerator::new(config.heatmap_dir());
    let reports = generator.generate_all(&config.base_dir, year)?;

    for report in &reports {
        let line = match report.status {
            FieldStatus::Written => format!(
                "{}: written {}",
                report.field,
                report.file.as_deref().unwrap_or_default()
            ),
            FieldStatus::Skipped => format!("{}: no data, skipped", report.field),
            FieldStatus::Failed => format!(
                "{}: failed ({})",
                report.field,
                report.error.as_deref().unwrap_or("unknown error")
            ),
        };
        prompter.say(&line)?;
    }

    if reports.iter().any(|r| r.status == FieldStatus::Failed) {
        return Err(AppError::Internal(anyhow::anyhow!(
            "some heatmaps could not be generated"
        )));
    }
    Ok(())
}
