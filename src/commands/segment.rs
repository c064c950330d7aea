//! `lexchat segment`: show how an answer is split around citation markers

use crate::citation_parser::{self, TextSegment};
use crate::error::Result;
use colored::Colorize;
use prettytable::{format, Table};

/// Render segments as a single line, highlighting resolved citations
pub fn render_segments(segments: &[TextSegment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            TextSegment::Text { content } => content.clone(),
            TextSegment::Citation { content, .. } => format!("[{}]", content).cyan().to_string(),
        })
        .collect()
}

/// Handle the segment command
pub fn run_segment(text: &str, citation_count: usize, json: bool) -> Result<()> {
    let segments = citation_parser::segment(text, citation_count);

    if json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["#".bold(), "Kind".bold(), "Content".bold(), "Citation".bold()]);

    for (position, segment) in segments.iter().enumerate() {
        let (kind, citation) = match segment.citation_index() {
            Some(index) => ("citation".cyan(), (index + 1).to_string()),
            None => ("text".normal(), "-".to_string()),
        };
        table.add_row(prettytable::row![position, kind, format!("{:?}", segment.content()), citation]);
    }

    println!();
    println!("{}", render_segments(&segments));
    println!();
    table.printstd();
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_render_segments_restores_markers() {
        colored::control::set_override(false);
        let segments = citation_parser::segment("Lihat [1] dan [7].", 1);
        assert_eq!(render_segments(&segments), "Lihat [1] dan [7].");
        colored::control::unset_override();
    }

    #[test]
    fn test_run_segment_accepts_empty_text() {
        assert!(run_segment("", 0, false).is_ok());
        assert!(run_segment("", 0, true).is_ok());
    }
}
