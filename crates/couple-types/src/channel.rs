/// The two fixed participants of the app.
pub const SAJID: &str = "sajid";
pub const NASYWA: &str = "nasywa";

/// Receiver value that may view any image.
pub const ADMIN: &str = "admin";

pub const PARTICIPANTS: [&str; 2] = [SAJID, NASYWA];

/// Derive the shared channel name for two participants.
///
/// Both sides subscribe to the same channel regardless of who initiates:
/// the identifiers are sorted lexicographically and joined with a hyphen.
pub fn channel_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{}-{}", a, b)
    } else {
        format!("{}-{}", b, a)
    }
}

/// Channel shared by the couple. Dashboard-wide events (activities, music,
/// location, settings) are published here.
pub fn default_channel() -> String {
    channel_key(SAJID, NASYWA)
}

/// Channel carrying comment updates for one day's activities.
pub fn activities_channel(date: &str) -> String {
    format!("activities-{}", date)
}

/// The other participant, if `role` is one of the couple.
pub fn partner_of(role: &str) -> Option<&'static str> {
    match role {
        SAJID => Some(NASYWA),
        NASYWA => Some(SAJID),
        _ => None,
    }
}

/// "sajid" -> "Sajid"
pub fn display_name(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
