//! Canonical path layout for exported markers.
//!
//! Every component is a pure function of the item's identity fields, so the
//! same catalog item always lands on the same path across runs.

use crate::sanitize::{sanitize, shorten};

/// Maps normalized items to relative paths under a movies or series root.
#[derive(Debug, Clone, Copy)]
pub struct PathMapper {
    component_limit: usize,
}

impl PathMapper {
    pub fn new(component_limit: usize) -> Self {
        Self { component_limit }
    }

    fn bound(&self, component: &str) -> String {
        shorten(&sanitize(component), self.component_limit)
    }

    /// `"Title (Year)"`, or just `"Title"` when the year is unknown.
    pub fn title_with_year(&self, title: &str, year: Option<u16>) -> String {
        let folder = match year {
            Some(y) => format!("{title} ({y})"),
            None => title.to_string(),
        };
        self.bound(&folder)
    }

    /// `[category, "Title (Year)"]` relative to the movies root.
    pub fn movie_folder(&self, category: &str, title: &str, year: Option<u16>) -> Vec<String> {
        vec![self.bound(category), self.title_with_year(title, year)]
    }

    /// `[category, "Title (Year)"]` relative to the series root.
    pub fn series_folder(&self, category: &str, title: &str, year: Option<u16>) -> Vec<String> {
        vec![self.bound(category), self.title_with_year(title, year)]
    }

    /// `"Season NN"`; season 0 is the "unspecified season" bucket and
    /// renders as `"Season 00"`.
    pub fn season_dir(&self, season: u32) -> String {
        self.bound(&format!("Season {season:02}"))
    }

    /// `"SxxEyy - Title"`, degrading to `"Sxx"` when the episode number is
    /// unknown (zero).
    pub fn episode_file_base(&self, season: u32, episode: u32, title: &str) -> String {
        let base = if episode == 0 {
            format!("S{season:02}")
        } else {
            format!("S{season:02}E{episode:02} - {title}")
        };
        self.bound(&base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> PathMapper {
        PathMapper::new(80)
    }

    #[test]
    fn test_movie_folder() {
        assert_eq!(
            mapper().movie_folder("Action", "Movie Name", Some(2023)),
            vec!["Action", "Movie Name (2023)"]
        );
        assert_eq!(
            mapper().movie_folder("Drama", "No Year", None),
            vec!["Drama", "No Year"]
        );
    }

    #[test]
    fn test_season_dir_zero_padding() {
        assert_eq!(mapper().season_dir(0), "Season 00");
        assert_eq!(mapper().season_dir(3), "Season 03");
        assert_eq!(mapper().season_dir(12), "Season 12");
    }

    #[test]
    fn test_episode_file_base() {
        assert_eq!(
            mapper().episode_file_base(3, 12, "The Title"),
            "S03E12 - The Title"
        );
        assert_eq!(mapper().episode_file_base(0, 0, "ignored"), "S00");
    }

    #[test]
    fn test_components_are_bounded() {
        let m = PathMapper::new(20);
        let long = "An Extremely Long Episode Title That Never Ends";
        let base = m.episode_file_base(1, 1, long);
        assert_eq!(base.chars().count(), 20);
    }

    #[test]
    fn test_determinism() {
        let a = mapper().movie_folder("Cat", "Title", Some(2020));
        let b = mapper().movie_folder("Cat", "Title", Some(2020));
        assert_eq!(a, b);
    }
}
