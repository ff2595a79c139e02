pub mod project;
pub mod routine;

pub use project::parse_project;
pub use routine::parse_routine;

/// `2h`, `1.5h`, `45m` to whole minutes. Anything else is `None`.
pub fn parse_duration(s: &str) -> Option<u32> {
    let s = s.trim();
    let unit = s.chars().last()?;
    let value: f64 = s[..s.len() - unit.len_utf8()].parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let minutes = match unit {
        'h' => value * 60.0,
        'm' => value,
        _ => return None,
    };
    Some(minutes.round() as u32)
}

/// Strip the `.md` suffix the engine never sees.
pub fn file_stem(filename: &str) -> &str {
    filename.strip_suffix(".md").unwrap_or(filename)
}
