//! Maps potentiometer channels to the Canyon plugin parameters they drive.

/// Every routed channel and its parameter address, in board order.
pub const ROUTING_TABLE: [(&str, &str); 6] = [
    ("@1", "/parameter/Canyon/Dry_Wet"),
    ("@2", "/parameter/Canyon/Gain"),
    ("@3", "/parameter/Canyon/Blend"),
    ("@4", "/parameter/Canyon/HighCut_Freq"),
    ("@5", "/parameter/Canyon/HighCut_FreqB"),
    ("@6", "/parameter/Canyon/LowCut_Freq"),
];

/// Looks up the parameter address for `channel`. Channels the board may
/// send but that are not wired to anything give `None`.
pub fn route(channel: &str) -> Option<&'static str> {
    match channel {
        "@1" => Some(ROUTING_TABLE[0].1),
        "@2" => Some(ROUTING_TABLE[1].1),
        "@3" => Some(ROUTING_TABLE[2].1),
        "@4" => Some(ROUTING_TABLE[3].1),
        "@5" => Some(ROUTING_TABLE[4].1),
        "@6" => Some(ROUTING_TABLE[5].1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_every_table_entry() {
        for (channel, address) in ROUTING_TABLE {
            assert_eq!(route(channel), Some(address));
        }
    }

    #[test]
    fn routes_known_addresses() {
        assert_eq!(route("@1"), Some("/parameter/Canyon/Dry_Wet"));
        assert_eq!(route("@6"), Some("/parameter/Canyon/LowCut_Freq"));
    }

    #[test]
    fn ignores_unknown_channels() {
        assert_eq!(route("@9"), None);
        assert_eq!(route("@0"), None);
        assert_eq!(route("1"), None);
        assert_eq!(route(""), None);
    }

    /// Matching is exact, so padding or case changes do not route.
    #[test]
    fn requires_exact_match() {
        assert_eq!(route(" @1"), None);
        assert_eq!(route("@10"), None);
    }
}
