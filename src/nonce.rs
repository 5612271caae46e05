use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// Generates a cryptographically random `state` nonce for the authorization redirect.
///
/// Returns a 22-character URL-safe string (16 random bytes → base64url).
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Compares a redirect `state` against the issued nonce without early exit.
#[must_use]
pub fn state_matches(issued: &str, received: &str) -> bool {
    if issued.len() != received.len() {
        return false;
    }
    issued
        .bytes()
        .zip(received.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_length() {
        let state = generate_state();
        assert_eq!(state.len(), 22);
    }

    #[test]
    fn test_state_url_safe() {
        let state = generate_state();
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "state should be URL-safe: {}",
            state
        );
    }

    #[test]
    fn test_state_uniqueness() {
        let s1 = generate_state();
        let s2 = generate_state();
        assert_ne!(s1, s2, "states should be unique");
    }

    #[test]
    fn test_state_matches_exactly() {
        assert!(state_matches("xyz", "xyz"));
        assert!(!state_matches("xyz", "abc"));
        assert!(!state_matches("xyz", "xyz "));
        assert!(!state_matches("xyz", ""));
    }
}
