//! Output formatting helpers for the CLI.

use chrono::Local;
use comfy_table::presets::NOTHING;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use moodlog_core::storage::{DiaryEntry, EmotionCount};
use moodlog_core::{style_for, Classification, Emotion, EmotionStyle, KEYWORDS};
use owo_colors::OwoColorize;

use crate::helpers::OutputFormat;

const SUMMARY_CHARS: usize = 60;

/// Applies emotion colors when the terminal supports them.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    pub color: bool,
}

impl Painter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Foreground as rendered on its own background (alpha applied).
    fn rgb(style: &EmotionStyle) -> Option<((u8, u8, u8), (u8, u8, u8))> {
        let bg = style.background().ok()?.to_rgb();
        let fg = style.foreground().ok()?.over(bg);
        Some((fg, bg))
    }

    /// Text in the emotion's foreground color.
    pub fn paint(&self, style: &EmotionStyle, text: &str) -> String {
        match Self::rgb(style).filter(|_| self.color) {
            Some(((r, g, b), _)) => text.truecolor(r, g, b).to_string(),
            None => text.to_string(),
        }
    }

    /// Text on the emotion's background, like the diary page itself.
    pub fn badge(&self, style: &EmotionStyle, text: &str) -> String {
        match Self::rgb(style).filter(|_| self.color) {
            Some(((r, g, b), (br, bg, bb))) => format!(" {} ", text)
                .truecolor(r, g, b)
                .on_truecolor(br, bg, bb)
                .bold()
                .to_string(),
            None => format!("[{}]", text),
        }
    }

    fn cell(&self, style: &EmotionStyle, text: &str) -> Cell {
        let cell = Cell::new(text);
        match Self::rgb(style).filter(|_| self.color) {
            Some(((r, g, b), _)) => cell.fg(Color::Rgb { r, g, b }),
            None => cell,
        }
    }
}

/// First line of an entry, shortened for tables.
pub fn entry_summary(entry: &DiaryEntry) -> String {
    let first_line = entry.text.lines().next().unwrap_or_default();
    if first_line.chars().count() > SUMMARY_CHARS {
        let cut: String = first_line.chars().take(SUMMARY_CHARS - 1).collect();
        format!("{}…", cut)
    } else {
        first_line.to_string()
    }
}

fn local_time(entry: &DiaryEntry) -> String {
    entry
        .created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Convert an entry to JSON for output.
pub fn entry_json(entry: &DiaryEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "text": entry.text,
        "emotion": entry.emotion,
        "emotion_name": entry.style().name,
        "created_at": entry.created_at,
        "device_id": entry.device_id,
    })
}

/// Convert multiple entries to JSON array for output.
pub fn entries_json(entries: &[DiaryEntry]) -> Vec<serde_json::Value> {
    entries.iter().map(entry_json).collect()
}

/// Classification plus style, as JSON.
pub fn analysis_json(classification: &Classification) -> serde_json::Value {
    let scores: serde_json::Map<String, serde_json::Value> = classification
        .scores
        .iter()
        .map(|(emotion, score)| (emotion.as_str().to_string(), score.into()))
        .collect();
    serde_json::json!({
        "emotion": classification.emotion,
        "style": style_for(classification.emotion),
        "scores": scores,
    })
}

/// Human-readable classification result.
pub fn print_analysis(painter: Painter, classification: &Classification, quiet: bool) {
    let style = style_for(classification.emotion);
    if quiet {
        println!("{}", classification.emotion);
        return;
    }
    println!(
        "{} {}",
        painter.badge(style, style.name),
        painter.paint(style, classification.emotion.as_str())
    );
    println!(
        "Today's music: {} - {}",
        painter.paint(style, style.music.title),
        style.music.artist
    );
    let hits: Vec<String> = classification
        .scores
        .iter()
        .filter(|(_, score)| *score > 0)
        .map(|(emotion, score)| format!("{}={}", emotion, score))
        .collect();
    if !hits.is_empty() {
        println!("Scores: {}", hits.join(" "));
    }
}

/// Print a single entry in human-readable format.
pub fn print_entry(painter: Painter, entry: &DiaryEntry, quiet: bool) {
    let style = entry.style();
    if !quiet {
        println!("ID: {}", entry.id);
        println!("Written: {}", local_time(entry));
        println!(
            "Emotion: {} ({})",
            painter.badge(style, style.name),
            entry.emotion
        );
        println!("Music: {} - {}", style.music.title, style.music.artist);
        println!();
    }
    println!("{}", entry.text);
}

/// Print entries as a table or plain lines, newest first.
pub fn print_entries(painter: Painter, entries: &[DiaryEntry], format: OutputFormat, quiet: bool) {
    match format {
        OutputFormat::Table => {
            if entries.is_empty() {
                if !quiet {
                    println!("No entries yet.");
                }
                return;
            }
            let mut table = Table::new();
            table.load_preset(NOTHING);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            if !quiet {
                let header = ["ID", "WRITTEN", "EMOTION", "SUMMARY"].map(|h| {
                    let cell = Cell::new(h);
                    if painter.color {
                        cell.add_attribute(Attribute::Dim)
                    } else {
                        cell
                    }
                });
                table.set_header(header);
            }
            for entry in entries {
                let style = entry.style();
                let id = entry.id.to_string();
                table.add_row(vec![
                    Cell::new(&id[..8]),
                    Cell::new(local_time(entry)),
                    painter.cell(style, style.name),
                    Cell::new(entry_summary(entry)),
                ]);
            }
            println!("{}", table);
        }
        OutputFormat::Plain => {
            for entry in entries {
                println!(
                    "{} {} {} {}",
                    entry.id,
                    entry.created_at.to_rfc3339(),
                    entry.emotion,
                    entry_summary(entry)
                );
            }
        }
    }
}

/// Per-emotion counts with a proportional bar.
pub fn print_stats(painter: Painter, counts: &[EmotionCount], quiet: bool) {
    let total: u64 = counts.iter().map(|c| c.count).sum();
    let widest = counts.iter().map(|c| c.count).max().unwrap_or(0).max(1);
    for count in counts {
        let style = style_for(count.emotion);
        let width = (count.count * 30 / widest) as usize;
        let bar = painter.paint(style, &"█".repeat(width));
        println!(
            "{:<9} {:>5}  {}",
            count.emotion.as_str(),
            count.count,
            bar
        );
    }
    if !quiet {
        println!("total     {:>5}", total);
    }
}

/// Counts as an array, keeping enumeration order.
pub fn stats_json(counts: &[EmotionCount]) -> serde_json::Value {
    serde_json::json!(counts)
}

/// Every emotion with its style and keywords.
pub fn registry_json() -> Vec<serde_json::Value> {
    Emotion::ALL
        .into_iter()
        .map(|emotion| {
            serde_json::json!({
                "emotion": emotion,
                "style": style_for(emotion),
                "keywords": keywords_for(emotion),
            })
        })
        .collect()
}

fn keywords_for(emotion: Emotion) -> Vec<&'static str> {
    KEYWORDS
        .iter()
        .filter(|(_, e)| *e == emotion)
        .map(|(keyword, _)| *keyword)
        .collect()
}

pub fn print_registry(painter: Painter) {
    for emotion in Emotion::ALL {
        let style = style_for(emotion);
        let keywords = keywords_for(emotion);
        println!(
            "{:<9} {}  {} - {}",
            emotion.as_str(),
            painter.badge(style, style.name),
            style.music.title,
            style.music.artist
        );
        if keywords.is_empty() {
            println!("          (default when nothing matches)");
        } else {
            println!("          {}", keywords.join(", "));
        }
    }
}
