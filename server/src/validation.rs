pub fn validate_team_name(name: &str) -> Result<(), String> {
    const MAX: usize = 50;
    let len = name.chars().count();
    if !(1..=MAX).contains(&len) {
        return Err(format!(
            "Failed team name length check: 1 <= length={len} <= {MAX}"
        ));
    }
    check_chars("team", name)
}

// Match sheets are trimmed field by field, so a name with outer whitespace
// could never be matched by an upload.
pub fn validate_player_name(name: &str) -> Result<(), String> {
    const MAX: usize = 40;
    let len = name.chars().count();
    if !(1..=MAX).contains(&len) {
        return Err(format!(
            "Failed player name length check: 1 <= length={len} <= {MAX}"
        ));
    }
    if name.trim() != name {
        return Err("Player name must not start or end with whitespace".to_owned());
    }
    check_chars("player", name)
}

fn check_chars(what: &str, name: &str) -> Result<(), String> {
    for c in name.chars() {
        if !char_allowed(c) {
            return Err(format!(
                "Disallowed characters found in {what} name: '{}' code={:x}",
                c.escape_default(),
                c as u32
            ));
        }
    }
    Ok(())
}

fn char_allowed(c: char) -> bool {
    !c.is_control() && c != ','
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_player_names() {
        assert!(validate_player_name("Kyle Katarn").is_ok());
        assert!(validate_player_name("Jan_Ors-2").is_ok());
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name(" Kyle").is_err());
        assert!(validate_player_name("Kyle,Jan").is_err());
        assert!(validate_player_name("Kyle\tKatarn").is_err());
        assert!(validate_player_name(&"x".repeat(41)).is_err());
    }

    #[test]
    fn test_team_names() {
        assert!(validate_team_name("Rogue Squadron").is_ok());
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name(&"y".repeat(51)).is_err());
    }
}
