/// Classification of a video's runtime for long-form-only feeds
///
/// `Unknown` is reserved for a parsed duration that still defies
/// classification; a missing or unparseable duration classifies `Short`
/// instead (see [`classify`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoLength {
    Long,
    Short,
    Unknown,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct DurationParts {
    days: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
    /// True when no `T` section was present (date-only durations like `P0D`)
    date_only: bool,
}

/// Classifies an ISO-8601 duration as long-form or short-form
///
/// The rule is strictly "> 60 seconds is Long": `PT1M` (exactly 60 s) is
/// Short, `PT1M1S` is Long. `None` and unparseable strings classify as
/// Short, so un-enriched videos are excluded from long-form feeds rather
/// than risk surfacing shorts. Days-only durations with no time section
/// are a sentinel some sources emit for live streams (`P0D`); those are
/// Short as well.
pub fn classify(duration: Option<&str>) -> VideoLength {
    let Some(parts) = duration.and_then(parse_iso8601_duration) else {
        return VideoLength::Short;
    };

    if parts.date_only {
        return VideoLength::Short;
    }

    let total_seconds =
        parts.days * 86_400 + parts.hours * 3_600 + parts.minutes * 60 + parts.seconds;

    if total_seconds > 60 {
        VideoLength::Long
    } else {
        VideoLength::Short
    }
}

/// Minimal ISO-8601 duration parser covering the `P[nD][T[nH][nM][nS]]`
/// shapes the content API emits. Returns `None` for anything else.
fn parse_iso8601_duration(input: &str) -> Option<DurationParts> {
    let mut chars = input.chars().peekable();
    if chars.next()? != 'P' {
        return None;
    }

    let mut parts = DurationParts {
        date_only: true,
        ..DurationParts::default()
    };
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;

    for c in chars {
        match c {
            'T' if !in_time && number.is_empty() => {
                in_time = true;
                parts.date_only = false;
            }
            '0'..='9' => number.push(c),
            'D' | 'H' | 'M' | 'S' => {
                let value: u64 = number.parse().ok()?;
                number.clear();
                match (c, in_time) {
                    ('D', false) => parts.days = value,
                    ('H', true) => parts.hours = value,
                    ('M', true) => parts.minutes = value,
                    ('S', true) => parts.seconds = value,
                    _ => return None,
                }
                saw_component = true;
            }
            _ => return None,
        }
    }

    if !saw_component || !number.is_empty() {
        return None;
    }

    Some(parts)
}
