use crate::analyze::ranker::{leaderboard, LeaderboardRow};
use crate::analyze::ComplianceReport;
use crate::model::{Error, Result};
use markdown_builder::Markdown;
use markdown_table::{Heading, HeadingAlignment, MarkdownTable};
use std::fs;
use std::path::Path;

pub trait MarkdownReport {
    fn report_render(&self) -> Result<String>;

    fn report_create(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.report_render()?)?;
        Ok(())
    }
}

impl MarkdownReport for ComplianceReport {
    fn report_render(&self) -> Result<String> {
        let mut doc = Markdown::new();
        doc.header1("🏆 Hackathon Live Leaderboard");
        doc.add_leaderboard(&leaderboard(self.values()))?;
        Ok(doc.render())
    }
}

trait MarkdownExt {
    fn add_leaderboard(&mut self, rows: &[LeaderboardRow]) -> Result<()>;
}

impl MarkdownExt for Markdown {
    fn add_leaderboard(&mut self, rows: &[LeaderboardRow]) -> Result<()> {
        if rows.is_empty() {
            self.paragraph("No teams registered.".to_string());
            return Ok(());
        }

        let header = ["Rank", "Team", "Compliance %", "Valid Commits", "Missed Windows"]
            .iter()
            .map(|title| Heading::new(title.to_string(), Some(HeadingAlignment::Center)))
            .collect::<Vec<_>>();
        let table = rows
            .iter()
            .map(|row| {
                vec![
                    row.rank.to_string(),
                    row.team_id.clone(),
                    format!("{:.2}", row.compliance_percent),
                    row.total_valid_commits.to_string(),
                    row.missed_window_count.to_string(),
                ]
            })
            .collect::<Vec<_>>();

        let mut md_table = MarkdownTable::new(table);
        md_table.with_headings(header);
        let rendered = md_table
            .as_markdown()
            .map_err(|e| Error::Report(format!("cannot render leaderboard table: {e:?}")))?;
        self.paragraph(rendered);
        Ok(())
    }
}
