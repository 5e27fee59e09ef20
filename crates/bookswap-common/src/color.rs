//! Author color assignment.

use crate::id::SessionId;

/// Colors handed out to chat authors.
pub const AUTHOR_PALETTE: [&str; 8] = [
    "#3B82F6", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6", "#EC4899", "#06B6D4", "#84CC16",
];

/// Pick a palette entry from the sum of the id's character codes.
///
/// Distinct sessions may share a color.
pub fn author_color(session: &SessionId) -> &'static str {
    let sum: u64 = session.as_str().chars().map(|c| c as u64).sum();
    AUTHOR_PALETTE[(sum % AUTHOR_PALETTE.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_deterministic() {
        let sid = SessionId::new();
        assert_eq!(author_color(&sid), author_color(&sid));
    }

    #[test]
    fn color_follows_char_sum() {
        // 'a' = 97, 97 % 8 = 1
        assert_eq!(author_color(&SessionId::from("a")), "#EF4444");
        // 'a' + 'g' = 97 + 103 = 200, 200 % 8 = 0
        assert_eq!(author_color(&SessionId::from("ag")), "#3B82F6");
    }

    #[test]
    fn color_is_from_palette() {
        for _ in 0..32 {
            let color = author_color(&SessionId::new());
            assert!(AUTHOR_PALETTE.contains(&color));
        }
    }
}
