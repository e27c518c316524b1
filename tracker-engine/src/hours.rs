use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"^(\d+(?:[.,]\d+)?|[.,]\d+)$").expect("decimal pattern compiles");
    static ref CLOCK: Regex = Regex::new(r"^(\d+):([0-5]?\d)$").expect("clock pattern compiles");
    static ref UNITS: Regex = Regex::new(
        r"^(?:(\d+(?:[.,]\d+)?)\s*h(?:ours?|rs?)?)?\s*(?:(\d+)\s*m(?:in(?:utes?)?)?)?$"
    )
    .expect("units pattern compiles");
    static ref HOURS_MINUTES: Regex = Regex::new(r"^(\d+)\s*h\s*(\d+)$").expect("hm pattern compiles");
}

fn decimal(text: &str) -> Option<f64> {
    text.replace(',', ".").parse().ok()
}

/// Parse user input such as `2`, `2,5`, `2:30`, `2h30`, `2h 30m`, `30m` or `2 hours`
pub fn parse_hours(input: &str) -> Option<f64> {
    let text = input.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if DECIMAL.is_match(&text) {
        return decimal(&text);
    }
    if let Some(caps) = CLOCK.captures(&text) {
        let hours: f64 = caps[1].parse().ok()?;
        let minutes: f64 = caps[2].parse().ok()?;
        return Some(hours + minutes / 60.0);
    }
    if let Some(caps) = HOURS_MINUTES.captures(&text) {
        let hours: f64 = caps[1].parse().ok()?;
        let minutes: f64 = caps[2].parse().ok()?;
        return Some(hours + minutes / 60.0);
    }
    if let Some(caps) = UNITS.captures(&text) {
        let hours = caps.get(1).map(|m| m.as_str());
        let minutes = caps.get(2).map(|m| m.as_str());
        if hours.is_none() && minutes.is_none() {
            return None;
        }
        let hours = match hours {
            Some(h) => decimal(h)?,
            None => 0.0,
        };
        let minutes: f64 = match minutes {
            Some(m) => m.parse().ok()?,
            None => 0.0,
        };
        return Some(hours + minutes / 60.0);
    }
    None
}
