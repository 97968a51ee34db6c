//! Command handlers.

use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::CommandFactory;
use clap_complete::generate;
use moodlog_core::storage::{AgeSqliteStorage, DiaryStore, EntryFilter, NewDiaryEntry};
use moodlog_core::{score, style_for, Emotion};
use tracing::{debug, info};

use crate::config::{self, MoodlogConfig};
use crate::helpers::{
    parse_datetime, parse_duration, parse_output_format, prompt_init_passphrase,
    prompt_passphrase, read_analyze_text, read_entry_body, OutputFormat,
};
use crate::output::{self, Painter};
use crate::{Cli, Commands};

/// Settings shared by every command.
pub struct Context {
    diary: Option<String>,
    // A broken config only fails the commands that need the diary.
    config: anyhow::Result<Option<MoodlogConfig>>,
    pub quiet: bool,
    pub painter: Painter,
}

impl Context {
    pub fn new(diary: Option<String>, quiet: bool, no_color: bool) -> Self {
        let config = config::load_config();
        if let Err(err) = &config {
            debug!(error = %err, "config unavailable");
        }

        let term_is_dumb = std::env::var("TERM").map(|v| v == "dumb").unwrap_or(false);
        let configured_color = config
            .as_ref()
            .ok()
            .and_then(|c| c.as_ref())
            .and_then(|c| c.ui.color);
        let color = !no_color
            && !term_is_dumb
            && std::env::var_os("NO_COLOR").is_none()
            && configured_color.unwrap_or_else(|| io::stdout().is_terminal());
        Self {
            diary,
            config,
            quiet,
            painter: Painter::new(color),
        }
    }

    fn config(&self) -> anyhow::Result<Option<&MoodlogConfig>> {
        match &self.config {
            Ok(config) => Ok(config.as_ref()),
            Err(err) => Err(anyhow::anyhow!("{:#}", err)),
        }
    }

    fn diary_path(&self) -> anyhow::Result<PathBuf> {
        let explicit = self.diary.as_deref().filter(|v| !v.trim().is_empty());
        let configured = match explicit {
            Some(_) => None,
            None => self.config()?,
        };
        config::resolve_diary_path(explicit, configured)
    }

    fn editor(&self) -> Option<&str> {
        self.config
            .as_ref()
            .ok()
            .and_then(|c| c.as_ref())
            .and_then(|c| c.ui.editor.as_deref())
    }

    fn open(&self) -> anyhow::Result<AgeSqliteStorage> {
        let path = self.diary_path()?;
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "No diary at {}. Run `moodlog init` first.",
                path.display()
            ));
        }
        let passphrase = prompt_passphrase()?;
        debug!(path = %path.display(), "opening diary");
        Ok(AgeSqliteStorage::open(&path, &passphrase)?)
    }
}

pub fn run(ctx: &Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init { path } => init(ctx, path),
        Commands::Analyze { text, json, follow } => analyze(ctx, text, json, follow),
        Commands::Add {
            body,
            date,
            no_input,
            json,
        } => add(ctx, body, date, no_input, json),
        Commands::List {
            emotion,
            last,
            since,
            until,
            limit,
            json,
            format,
        } => {
            let mut filter = EntryFilter::new();
            if let Some(tag) = emotion {
                filter = filter.emotion(parse_emotion(&tag)?);
            }
            if let Some(ref window) = last {
                filter = filter.since(Utc::now() - parse_duration(window)?);
            }
            if let Some(value) = since {
                filter = filter.since(parse_datetime(&value)?);
            }
            if let Some(value) = until {
                filter = filter.until(parse_datetime(&value)?);
            }
            if let Some(limit) = limit {
                filter = filter.limit(limit);
            }

            let storage = ctx.open()?;
            let entries = storage.list_entries(&filter)?;
            print_listing(ctx, &entries, json, format.as_deref())
        }
        Commands::Search {
            query,
            emotion,
            limit,
            json,
            format,
        } => {
            let emotion = emotion.as_deref().map(parse_emotion).transpose()?;
            let storage = ctx.open()?;
            let mut entries = storage.search_entries(&query)?;
            if let Some(emotion) = emotion {
                entries.retain(|entry| entry.emotion == emotion);
            }
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            print_listing(ctx, &entries, json, format.as_deref())
        }
        Commands::Show { id, json } => {
            let storage = ctx.open()?;
            let entry = storage
                .find_by_prefix(&id)?
                .ok_or_else(|| anyhow::anyhow!("Entry not found: {}", id))?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::entry_json(&entry))?
                );
            } else {
                output::print_entry(ctx.painter, &entry, ctx.quiet);
            }
            Ok(())
        }
        Commands::Stats { last, since, json } => {
            let mut filter = EntryFilter::new();
            if let Some(ref window) = last {
                filter = filter.since(Utc::now() - parse_duration(window)?);
            }
            if let Some(value) = since {
                filter = filter.since(parse_datetime(&value)?);
            }
            let storage = ctx.open()?;
            let counts = storage.emotion_counts(&filter)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::stats_json(&counts))?
                );
            } else {
                output::print_stats(ctx.painter, &counts, ctx.quiet);
            }
            Ok(())
        }
        Commands::Emotions { json } => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::registry_json())?
                );
            } else {
                output::print_registry(ctx.painter);
            }
            Ok(())
        }
        Commands::Export {
            format,
            emotion,
            since,
        } => {
            let mut filter = EntryFilter::new();
            if let Some(tag) = emotion {
                filter = filter.emotion(parse_emotion(&tag)?);
            }
            if let Some(value) = since {
                filter = filter.since(parse_datetime(&value)?);
            }
            let storage = ctx.open()?;
            let entries = storage.list_entries(&filter)?;
            match format.as_str() {
                "json" => {
                    let value = output::entries_json(&entries);
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                "jsonl" => {
                    for value in output::entries_json(&entries) {
                        println!("{}", serde_json::to_string(&value)?);
                    }
                }
                other => {
                    return Err(anyhow::anyhow!(
                        "Unsupported export format: {} (use json or jsonl)",
                        other
                    ));
                }
            }
            Ok(())
        }
        Commands::Check => {
            let storage = ctx.open()?;
            match storage.check_integrity() {
                Ok(()) => {
                    if !ctx.quiet {
                        println!("Integrity check: OK");
                        println!("- sqlite: OK");
                        println!("- metadata keys: OK");
                        println!("- emotion tags: OK");
                        println!("- entry text: OK");
                    }
                    Ok(())
                }
                Err(err) => {
                    eprintln!("Integrity check: FAILED");
                    eprintln!("- error: {}", err);
                    Err(anyhow::anyhow!("Integrity check failed"))
                }
            }
        }
        Commands::Backup { destination } => backup(ctx, &destination),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "moodlog", &mut io::stdout());
            Ok(())
        }
    }
}

fn parse_emotion(value: &str) -> anyhow::Result<Emotion> {
    Ok(value.parse::<Emotion>()?)
}

fn init(ctx: &Context, path: Option<String>) -> anyhow::Result<()> {
    let target = match path {
        Some(value) => PathBuf::from(value),
        None => ctx.diary_path()?,
    };

    let passphrase = prompt_init_passphrase()?;
    let device_id = AgeSqliteStorage::create(&target, &passphrase)?;
    info!(path = %target.display(), %device_id, "initialized diary");

    let config_path = config::default_config_path()?;
    if config_path.exists() {
        debug!(path = %config_path.display(), "keeping existing config");
    } else {
        config::write_config(&config_path, &MoodlogConfig::new(&absolute(&target)))?;
    }

    if !ctx.quiet {
        println!("Initialized new diary at {}", target.display());
    }
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn analyze(ctx: &Context, text: Option<String>, json: bool, follow: bool) -> anyhow::Result<()> {
    if !follow {
        let text = read_analyze_text(text)?;
        let classification = score(&text);
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output::analysis_json(&classification))?
            );
        } else {
            output::print_analysis(ctx.painter, &classification, ctx.quiet);
        }
        return Ok(());
    }

    if text.is_some() {
        return Err(anyhow::anyhow!("--follow reads from stdin; drop the TEXT argument"));
    }

    // Every line re-scores the whole text so far, like typing into the page.
    let mut accumulated = String::new();
    let mut previous: Option<Emotion> = None;
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
        if !accumulated.is_empty() {
            accumulated.push('\n');
        }
        accumulated.push_str(&line);

        let classification = score(&accumulated);
        if json {
            println!(
                "{}",
                serde_json::to_string(&output::analysis_json(&classification))?
            );
        } else if previous != Some(classification.emotion) {
            if ctx.quiet {
                println!("{}", classification.emotion);
            } else {
                let style = style_for(classification.emotion);
                println!(
                    "{} {} - {}",
                    ctx.painter.badge(style, style.name),
                    style.music.title,
                    style.music.artist
                );
            }
        }
        previous = Some(classification.emotion);
    }
    Ok(())
}

fn add(
    ctx: &Context,
    body: Option<String>,
    date: Option<String>,
    no_input: bool,
    json: bool,
) -> anyhow::Result<()> {
    let created_at = date.as_deref().map(parse_datetime).transpose()?;
    let mut storage = ctx.open()?;

    let text = read_entry_body(no_input, body, ctx.editor())?;
    let mut new_entry = NewDiaryEntry::new(text);
    if let Some(when) = created_at {
        new_entry = new_entry.with_created_at(when);
    }

    let entry_id = storage.insert_entry(&new_entry)?;
    storage.close()?;
    let emotion = new_entry.emotion();
    info!(%entry_id, %emotion, "saved entry");

    let style = style_for(emotion);
    if json {
        let value = serde_json::json!({
            "id": entry_id,
            "emotion": emotion,
            "emotion_name": style.name,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if ctx.quiet {
        println!("{}", entry_id);
    } else {
        println!(
            "Saved entry {} {}",
            entry_id,
            ctx.painter.badge(style, style.name)
        );
        println!(
            "Today's music: {} - {}",
            ctx.painter.paint(style, style.music.title),
            style.music.artist
        );
    }
    Ok(())
}

fn print_listing(
    ctx: &Context,
    entries: &[moodlog_core::storage::DiaryEntry],
    json: bool,
    format: Option<&str>,
) -> anyhow::Result<()> {
    let format = parse_output_format(format)?;
    if json {
        if format.is_some() {
            return Err(anyhow::anyhow!("--format cannot be used with --json"));
        }
        let output = serde_json::to_string_pretty(&output::entries_json(entries))?;
        println!("{}", output);
    } else {
        output::print_entries(
            ctx.painter,
            entries,
            format.unwrap_or(OutputFormat::Table),
            ctx.quiet,
        );
    }
    Ok(())
}

fn backup(ctx: &Context, destination: &str) -> anyhow::Result<()> {
    let source = ctx.diary_path()?;
    if Path::new(destination).exists() {
        return Err(anyhow::anyhow!(
            "Backup destination already exists: {}",
            destination
        ));
    }
    let count = std::fs::copy(&source, destination).map_err(|e| {
        anyhow::anyhow!(
            "Failed to copy diary from {} to {}: {}",
            source.display(),
            destination,
            e
        )
    })?;
    if count == 0 {
        return Err(anyhow::anyhow!("Backup failed: zero bytes written"));
    }
    if !ctx.quiet {
        println!("Backed up diary to {}", destination);
    }
    Ok(())
}
