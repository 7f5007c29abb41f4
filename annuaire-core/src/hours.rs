//! Opening-hours normalisation.
//!
//! The external source stores schedules as free text like
//! `"Mo-Fr 08:00-19:00; Sa 08:00-13:00"`. [`parse_opening_hours`] expands the
//! recognised day specs into a per-day schedule; anything it cannot make
//! sense of is passed through verbatim as [`OpeningHours::Raw`] so callers
//! must handle both shapes explicitly.

use serde::Serialize;

/// Day slots a segment's time spec can be written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// The fixed day-spec table. Only these tokens are recognised; arbitrary
/// ranges such as `Tu-Sa` are not expanded.
const DAY_SPECS: &[(&str, &[Day])] = &[
    ("Mo", &[Day::Monday]),
    ("Tu", &[Day::Tuesday]),
    ("We", &[Day::Wednesday]),
    ("Th", &[Day::Thursday]),
    ("Fr", &[Day::Friday]),
    ("Sa", &[Day::Saturday]),
    ("Su", &[Day::Sunday]),
    (
        "Mo-Fr",
        &[Day::Monday, Day::Tuesday, Day::Wednesday, Day::Thursday, Day::Friday],
    ),
    (
        "Mo-Sa",
        &[
            Day::Monday,
            Day::Tuesday,
            Day::Wednesday,
            Day::Thursday,
            Day::Friday,
            Day::Saturday,
        ],
    ),
    (
        "Mo-Su",
        &[
            Day::Monday,
            Day::Tuesday,
            Day::Wednesday,
            Day::Thursday,
            Day::Friday,
            Day::Saturday,
            Day::Sunday,
        ],
    ),
];

/// Value recorded for days no segment covers.
const CLOSED: &str = "closed";

/// Per-day schedule with every day defaulting to `"closed"`.
///
/// Serialises as a seven-key JSON object (`monday` .. `sunday`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSchedule {
    pub monday: String,
    pub tuesday: String,
    pub wednesday: String,
    pub thursday: String,
    pub friday: String,
    pub saturday: String,
    pub sunday: String,
}

impl Default for WeekSchedule {
    fn default() -> Self {
        Self {
            monday: CLOSED.to_owned(),
            tuesday: CLOSED.to_owned(),
            wednesday: CLOSED.to_owned(),
            thursday: CLOSED.to_owned(),
            friday: CLOSED.to_owned(),
            saturday: CLOSED.to_owned(),
            sunday: CLOSED.to_owned(),
        }
    }
}

impl WeekSchedule {
    fn slot_mut(&mut self, day: Day) -> &mut String {
        match day {
            Day::Monday => &mut self.monday,
            Day::Tuesday => &mut self.tuesday,
            Day::Wednesday => &mut self.wednesday,
            Day::Thursday => &mut self.thursday,
            Day::Friday => &mut self.friday,
            Day::Saturday => &mut self.saturday,
            Day::Sunday => &mut self.sunday,
        }
    }
}

/// Outcome of normalising an opening-hours string.
///
/// `Weekly` serialises as the seven-day object, `Raw` as `{"raw": "..."}`,
/// matching the two response shapes the API exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OpeningHours {
    /// At least one segment matched a recognised day spec.
    Weekly(WeekSchedule),
    /// Nothing matched; the original string is passed through.
    Raw {
        /// The unparsed schedule text.
        raw: String,
    },
}

/// Normalise a semicolon-delimited schedule string.
///
/// Segments have the shape `<day-spec> <time-spec>`. Each recognised day
/// spec overwrites the covered days with its time spec; a day covered by
/// several segments keeps the last one (no merging). When no segment matches
/// a recognised day spec the input is returned untouched as
/// [`OpeningHours::Raw`].
///
/// # Examples
/// ```
/// use annuaire_core::{OpeningHours, parse_opening_hours};
///
/// let OpeningHours::Weekly(week) = parse_opening_hours("Mo-Fr 08:00-19:00; Sa 08:00-13:00")
/// else {
///     panic!("expected a weekly schedule");
/// };
/// assert_eq!(week.monday, "08:00-19:00");
/// assert_eq!(week.saturday, "08:00-13:00");
/// assert_eq!(week.sunday, "closed");
/// ```
#[must_use]
pub fn parse_opening_hours(input: &str) -> OpeningHours {
    let mut week = WeekSchedule::default();
    let mut matched = false;

    for segment in input.split(';') {
        let Some((day_spec, time_spec)) = split_segment(segment) else {
            continue;
        };
        let Some(days) = expand_day_spec(day_spec) else {
            continue;
        };
        matched = true;
        for day in days {
            *week.slot_mut(*day) = time_spec.clone();
        }
    }

    if matched {
        OpeningHours::Weekly(week)
    } else {
        OpeningHours::Raw {
            raw: input.to_owned(),
        }
    }
}

/// Split a segment into its day spec and time spec.
///
/// The day spec is a leading run of letters and hyphens followed by
/// whitespace; the time spec is whatever non-empty text remains.
fn split_segment(segment: &str) -> Option<(&str, String)> {
    let trimmed = segment.trim();
    let (day_spec, rest) = trimmed.split_once(char::is_whitespace)?;
    if day_spec.is_empty()
        || !day_spec
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '-')
    {
        return None;
    }
    let time_spec = rest.trim_start();
    if time_spec.is_empty() {
        return None;
    }
    Some((day_spec, time_spec.to_owned()))
}

fn expand_day_spec(token: &str) -> Option<&'static [Day]> {
    DAY_SPECS
        .iter()
        .find(|(spec, _)| *spec == token)
        .map(|(_, days)| *days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn weekly(input: &str) -> WeekSchedule {
        match parse_opening_hours(input) {
            OpeningHours::Weekly(week) => week,
            OpeningHours::Raw { raw } => panic!("expected weekly schedule, got raw {raw:?}"),
        }
    }

    #[rstest]
    fn weekday_range_and_saturday() {
        let week = weekly("Mo-Fr 08:00-19:00; Sa 08:00-13:00");
        assert_eq!(week.monday, "08:00-19:00");
        assert_eq!(week.tuesday, "08:00-19:00");
        assert_eq!(week.wednesday, "08:00-19:00");
        assert_eq!(week.thursday, "08:00-19:00");
        assert_eq!(week.friday, "08:00-19:00");
        assert_eq!(week.saturday, "08:00-13:00");
        assert_eq!(week.sunday, "closed");
    }

    #[rstest]
    fn later_segments_win() {
        let week = weekly("Mo 08:00-12:00; Mo-Fr 09:00-17:00");
        assert_eq!(week.monday, "09:00-17:00");
        assert_eq!(week.friday, "09:00-17:00");
    }

    #[rstest]
    fn full_week_token_covers_sunday() {
        let week = weekly("Mo-Su 10:00-22:00");
        assert_eq!(week.monday, "10:00-22:00");
        assert_eq!(week.sunday, "10:00-22:00");
    }

    #[rstest]
    fn unrecognised_day_token_is_skipped() {
        // Tu-Sa is not in the fixed table; only the second segment applies.
        let week = weekly("Tu-Sa 09:00-18:00; Su 10:00-12:00");
        assert_eq!(week.tuesday, "closed");
        assert_eq!(week.saturday, "closed");
        assert_eq!(week.sunday, "10:00-12:00");
    }

    #[rstest]
    #[case("24/7")]
    #[case("sunrise-sunset")]
    #[case("")]
    fn unparsable_input_passes_through_raw(#[case] input: &str) {
        assert_eq!(
            parse_opening_hours(input),
            OpeningHours::Raw {
                raw: input.to_owned()
            }
        );
    }

    #[rstest]
    fn weekly_serialises_as_day_map() {
        let json = serde_json::to_value(parse_opening_hours("Sa 08:00-13:00"))
            .expect("serialise schedule");
        assert_eq!(json["saturday"], "08:00-13:00");
        assert_eq!(json["monday"], "closed");
    }

    #[rstest]
    fn raw_serialises_with_raw_key() {
        let json = serde_json::to_value(parse_opening_hours("24/7")).expect("serialise raw");
        assert_eq!(json["raw"], "24/7");
    }
}
