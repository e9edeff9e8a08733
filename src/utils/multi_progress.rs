use crate::utils::ProgressStyleTemplate;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub trait MultiProgressNew {
    fn add_with_style(&self, pb: ProgressBar, style: ProgressStyle) -> ProgressBar;

    /// Bar counting checked teams of one organization.
    fn add_teams_bar(&self, teams: usize, organization: &str) -> ProgressBar {
        let pb = self.add_with_style(
            ProgressBar::new(teams as u64),
            ProgressStyleTemplate::teams_bar(),
        );
        pb.set_message(format!("{organization} ..."));
        pb
    }
}

impl MultiProgressNew for MultiProgress {
    fn add_with_style(&self, pb: ProgressBar, style: ProgressStyle) -> ProgressBar {
        let pb = self.add(pb);
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}
