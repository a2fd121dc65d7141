//! Weekly rotating menus.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MenuError {
    #[error("duplicate menu week: {0}")]
    DuplicateWeek(String),
    #[error("menu week {0} ends before it starts")]
    InvertedDates(String),
}

/// Dietary tag on a dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DietTag {
    Gf,
    Df,
    V,
    Vg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<DietTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMenu {
    pub day: String,
    pub lunch: MenuItem,
    pub dinner: Vec<MenuItem>,
    #[serde(default)]
    pub dessert: Option<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekMenu {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub theme: Option<String>,
    pub days: Vec<DayMenu>,
}

impl WeekMenu {
    /// Whether `date` falls in this week, both ends inclusive.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start_date..=self.end_date).contains(&date)
    }
}

/// All published weeks, sorted by start date.
#[derive(Debug, Clone, Default)]
pub struct MenuCatalog {
    weeks: Vec<WeekMenu>,
}

impl MenuCatalog {
    /// # Errors
    ///
    /// Rejects duplicate week ids and weeks ending before they start.
    pub fn new(mut weeks: Vec<WeekMenu>) -> Result<Self, MenuError> {
        weeks.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));

        let mut seen = HashSet::new();
        for week in &weeks {
            if week.end_date < week.start_date {
                return Err(MenuError::InvertedDates(week.id.clone()));
            }
            if !seen.insert(week.id.as_str()) {
                return Err(MenuError::DuplicateWeek(week.id.clone()));
            }
        }

        Ok(Self { weeks })
    }

    #[must_use]
    pub fn weeks(&self) -> &[WeekMenu] {
        &self.weeks
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&WeekMenu> {
        self.weeks.iter().find(|w| w.id == id)
    }

    /// The week containing `today`, else the next upcoming week, else the
    /// most recent past week.
    #[must_use]
    pub fn current_week(&self, today: NaiveDate) -> Option<&WeekMenu> {
        self.weeks
            .iter()
            .find(|w| w.contains(today))
            .or_else(|| self.weeks.iter().find(|w| w.start_date > today))
            .or_else(|| self.weeks.last())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn week(id: &str, start: &str, end: &str) -> WeekMenu {
        WeekMenu {
            id: id.to_owned(),
            start_date: date(start),
            end_date: date(end),
            theme: None,
            days: Vec::new(),
        }
    }

    fn catalog() -> MenuCatalog {
        MenuCatalog::new(vec![
            week("week-2026-01-13", "2026-01-13", "2026-01-17"),
            week("week-2026-01-06", "2026-01-06", "2026-01-10"),
        ])
        .unwrap()
    }

    #[test]
    fn test_sorted_by_start() {
        let c = catalog();
        let ids: Vec<&str> = c.weeks().iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["week-2026-01-06", "week-2026-01-13"]);
    }

    #[test]
    fn test_current_week() {
        let c = catalog();
        assert_eq!(c.current_week(date("2026-01-10")).unwrap().id, "week-2026-01-06");
        // weekend between weeks: next upcoming
        assert_eq!(c.current_week(date("2026-01-11")).unwrap().id, "week-2026-01-13");
        // after the last week: most recent
        assert_eq!(c.current_week(date("2026-03-01")).unwrap().id, "week-2026-01-13");
        assert!(MenuCatalog::default().current_week(date("2026-01-01")).is_none());
    }

    #[test]
    fn test_rejects_bad_weeks() {
        assert_eq!(
            MenuCatalog::new(vec![week("w", "2026-01-10", "2026-01-06")]).unwrap_err(),
            MenuError::InvertedDates("w".to_owned())
        );
        assert!(matches!(
            MenuCatalog::new(vec![
                week("w", "2026-01-06", "2026-01-10"),
                week("w", "2026-01-13", "2026-01-17"),
            ]),
            Err(MenuError::DuplicateWeek(_))
        ));
    }

    #[test]
    fn test_item_json_shape() {
        let json = r#"{"day":"MON","lunch":{"name":"Leek & Goat Cheese Tart","description":"With radicchio salad","tags":["v"]},"dinner":[],"dessert":null}"#;
        let day: DayMenu = serde_json::from_str(json).unwrap();
        assert_eq!(day.lunch.tags, vec![DietTag::V]);
        assert!(day.dessert.is_none());
    }
}
