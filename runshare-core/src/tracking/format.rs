//! Display formatting for distance, duration and pace.

use super::session::SessionSnapshot;

/// Placeholder shown when pace is unavailable.
pub const PACE_PLACEHOLDER: &str = "--'--\"";

/// `"850m"` below one kilometer, `"1.23km"` above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters as u64)
    } else {
        format!("{:.2}km", meters / 1000.0)
    }
}

/// `"MM:SS"`, or `"H:MM:SS"` from one hour on.
pub fn format_duration(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// `5'30"` style pace.
pub fn format_pace(pace_min_per_km: Option<f64>) -> String {
    match pace_min_per_km {
        Some(pace) if pace.is_finite() && pace > 0.0 => {
            let minutes = pace.trunc() as u64;
            let seconds = ((pace - pace.trunc()) * 60.0) as u64;
            format!("{}'{:02}\"", minutes, seconds)
        }
        _ => PACE_PLACEHOLDER.to_string(),
    }
}

/// One-line summary for an ongoing-session notification.
pub fn notification_text(snapshot: &SessionSnapshot) -> String {
    let mut text = format!(
        "{:.2} km · {}",
        snapshot.distance_meters / 1000.0,
        format_duration(snapshot.duration_ms)
    );
    if let Some(pace) = snapshot.pace_min_per_km() {
        text.push_str(" · ");
        text.push_str(&format_pace(Some(pace)));
        text.push_str("/km");
    }
    text
}
