//! Orthodox feast calendar: fixed feasts from the holiday table plus the
//! movable feasts of the Paschal cycle.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{Datelike, Days, Local, NaiveDate};

use crate::catalog::ContentCatalog;

/// Movable feasts as (days after Pascha, name).
const MOVABLE_FEASTS: &[(i64, &str)] = &[
    (-7, "Вход Господень в Иерусалим"),
    (0, "Светлое Христово Воскресение. Пасха"),
    (39, "Вознесение Господне"),
    (49, "День Святой Троицы. Пятидесятница"),
];

pub struct HolidayCalendar {
    catalog: Arc<ContentCatalog>,
}

impl HolidayCalendar {
    pub fn new(catalog: Arc<ContentCatalog>) -> Self {
        Self { catalog }
    }

    pub fn today(&self) -> Option<String> {
        self.holiday_on(Local::now().date_naive())
    }

    /// Feast(s) celebrated on `date` (civil calendar), joined when several coincide.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<String> {
        let mut names: Vec<&str> = Vec::new();
        if let Some(name) = fixed_feast(&self.catalog.fixed_holidays, date) {
            names.push(name);
        }
        names.extend(movable_feast(date));

        if names.is_empty() {
            None
        } else {
            Some(names.join(" и "))
        }
    }
}

fn fixed_feast(table: &BTreeMap<String, String>, date: NaiveDate) -> Option<&str> {
    let key = format!("{:02}-{:02}", date.month(), date.day());
    table.get(&key).map(String::as_str)
}

fn movable_feast(date: NaiveDate) -> Option<&'static str> {
    let pascha = orthodox_pascha(date.year())?;
    let offset = date.signed_duration_since(pascha).num_days();
    MOVABLE_FEASTS
        .iter()
        .find(|(days, _)| *days == offset)
        .map(|(_, name)| *name)
}

/// Orthodox Pascha for `year` as a civil (Gregorian) date.
///
/// Julian computus (Meeus), then shifted by the Julian/Gregorian gap.
pub fn orthodox_pascha(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(4);
    let b = year.rem_euclid(7);
    let c = year.rem_euclid(19);
    let d = (19 * c + 15) % 30;
    let e = (2 * a + 4 * b - d + 34) % 7;
    let month = (d + e + 114) / 31;
    let day = (d + e + 114) % 31 + 1;

    let julian = NaiveDate::from_ymd_opt(year, month as u32, day as u32)?;
    let gap = year / 100 - year / 400 - 2;
    julian.checked_add_days(Days::new(gap.max(0) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> HolidayCalendar {
        let mut fixed = BTreeMap::new();
        fixed.insert("01-07".to_string(), "Рождество Христово".to_string());
        fixed.insert("04-07".to_string(), "Благовещение Пресвятой Богородицы".to_string());
        HolidayCalendar::new(Arc::new(ContentCatalog {
            fixed_holidays: fixed,
            ..Default::default()
        }))
    }

    #[test]
    fn pascha_known_years() {
        assert_eq!(orthodox_pascha(2023), Some(date(2023, 4, 16)));
        assert_eq!(orthodox_pascha(2024), Some(date(2024, 5, 5)));
        assert_eq!(orthodox_pascha(2025), Some(date(2025, 4, 20)));
        assert_eq!(orthodox_pascha(2026), Some(date(2026, 4, 12)));
    }

    #[test]
    fn fixed_feast_lookup() {
        let c = calendar();
        assert_eq!(c.holiday_on(date(2025, 1, 7)).as_deref(), Some("Рождество Христово"));
        assert_eq!(c.holiday_on(date(2025, 1, 8)), None);
    }

    #[test]
    fn movable_feasts_follow_pascha() {
        let c = calendar();
        assert_eq!(
            c.holiday_on(date(2025, 4, 20)).as_deref(),
            Some("Светлое Христово Воскресение. Пасха")
        );
        assert_eq!(
            c.holiday_on(date(2025, 4, 13)).as_deref(),
            Some("Вход Господень в Иерусалим")
        );
        assert_eq!(c.holiday_on(date(2025, 5, 29)).as_deref(), Some("Вознесение Господне"));
        assert_eq!(
            c.holiday_on(date(2025, 6, 8)).as_deref(),
            Some("День Святой Троицы. Пятидесятница")
        );
    }

    #[test]
    fn coinciding_feasts_are_joined() {
        let mut fixed = BTreeMap::new();
        fixed.insert("04-20".to_string(), "Память святого".to_string());
        let c = HolidayCalendar::new(Arc::new(ContentCatalog {
            fixed_holidays: fixed,
            ..Default::default()
        }));
        assert_eq!(
            c.holiday_on(date(2025, 4, 20)).as_deref(),
            Some("Память святого и Светлое Христово Воскресение. Пасха")
        );
    }
}
