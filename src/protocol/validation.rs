//! Input validation for the RPC surface.

pub const MAX_PLAYER_NAME_LENGTH: usize = 32;

/// Validate a player name: non-blank, bounded length, and limited to
/// alphanumerics (any script), spaces, `-` and `_`, with no surrounding
/// whitespace.
pub fn validate_player_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Player name cannot be empty".to_string());
    }
    if name.len() > MAX_PLAYER_NAME_LENGTH {
        return Err(format!(
            "Player name too long (max {MAX_PLAYER_NAME_LENGTH} characters)"
        ));
    }

    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Player name cannot be blank".to_string());
    }
    if trimmed.len() != name.len() {
        return Err("Player name cannot have leading or trailing whitespace".to_string());
    }

    for ch in name.chars() {
        if ch == ' ' {
            continue;
        }
        if ch.is_whitespace() {
            return Err("Player name contains invalid whitespace".to_string());
        }
        if !(ch.is_alphanumeric() || ch == '-' || ch == '_') {
            return Err("Player name contains invalid characters".to_string());
        }
    }

    Ok(())
}
