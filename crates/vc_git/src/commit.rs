/// Per-commit OpenPGP verification outcome, as reported by `git log %G?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Valid signature from a fully trusted key.
    Good,
    /// Valid signature from a key whose local trust level is not established.
    GoodUnknownTrust,
    /// Signature present but unusable: bad, or made with an expired or
    /// revoked key, or the key is missing.
    Bad,
    /// No signature.
    None,
}

impl SignatureStatus {
    pub fn from_git_char(c: char) -> Self {
        match c {
            'G' => Self::Good,
            'U' => Self::GoodUnknownTrust,
            'B' | 'E' | 'X' | 'Y' | 'R' => Self::Bad,
            _ => Self::None,
        }
    }

    /// Whether the signature cryptographically validates. The local trust
    /// level is deliberately not consulted: a key obtained from the
    /// authoritative directory is sufficient to accept the signer.
    pub fn is_verified(self) -> bool {
        matches!(self, Self::Good | Self::GoodUnknownTrust)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::GoodUnknownTrust => "good (unknown trust)",
            Self::Bad => "bad",
            Self::None => "unsigned",
        }
    }
}

/// One entry of the signature-status log, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCommit {
    pub oid: String,
    pub status: SignatureStatus,
}

/// Parse `git log --pretty=%G? %H` output. The grammar is one
/// `<status-char> <40-hex-oid>` per line; lines that do not match are
/// skipped rather than reported.
pub fn parse_signature_log(input: &str) -> Vec<SignedCommit> {
    input
        .lines()
        .filter_map(|line| {
            let (status, oid) = line.trim().split_once(' ')?;
            let mut chars = status.chars();
            let status = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            if oid.len() != 40 || !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            Some(SignedCommit {
                oid: oid.to_string(),
                status: SignatureStatus::from_git_char(status),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_git_char() {
        assert_eq!(SignatureStatus::from_git_char('G'), SignatureStatus::Good);
        assert_eq!(
            SignatureStatus::from_git_char('U'),
            SignatureStatus::GoodUnknownTrust
        );
        for c in ['B', 'E', 'X', 'Y', 'R'] {
            assert_eq!(SignatureStatus::from_git_char(c), SignatureStatus::Bad);
        }
        assert_eq!(SignatureStatus::from_git_char('N'), SignatureStatus::None);
        assert_eq!(SignatureStatus::from_git_char('?'), SignatureStatus::None);
    }

    #[test]
    fn test_only_good_and_unknown_trust_verify() {
        assert!(SignatureStatus::Good.is_verified());
        assert!(SignatureStatus::GoodUnknownTrust.is_verified());
        assert!(!SignatureStatus::Bad.is_verified());
        assert!(!SignatureStatus::None.is_verified());
    }

    #[test]
    fn test_parse_signature_log() {
        let log = "\
N 30598f4c1d88de9e6366f682d305b4c6334922a4
G 884728bc7d54cf9c865e3cdb0364280d855abe77
U 859402e221168ae1922da415f623cf2eef1afdcb
";
        let commits = parse_signature_log(log);
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].status, SignatureStatus::None);
        assert_eq!(commits[1].status, SignatureStatus::Good);
        assert_eq!(commits[1].oid, "884728bc7d54cf9c865e3cdb0364280d855abe77");
        assert_eq!(commits[2].status, SignatureStatus::GoodUnknownTrust);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let log = "\
garbage
G deadbeef
GG 30598f4c1d88de9e6366f682d305b4c6334922a4
B 859402e221168ae1922da415f623cf2eef1afdcbzz
E 1aec78c47d215f6e93ea68a1207296bd113c2f44
";
        let commits = parse_signature_log(log);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].oid, "1aec78c47d215f6e93ea68a1207296bd113c2f44");
        assert_eq!(commits[0].status, SignatureStatus::Bad);
    }

    #[test]
    fn test_parse_empty_log() {
        assert!(parse_signature_log("").is_empty());
    }

    #[test]
    fn test_first_verified_entry_wins() {
        // The scan accepts the newest entry whose signature validates,
        // regardless of whether the trust level is established.
        let log = "\
N 30598f4c1d88de9e6366f682d305b4c6334922a4
B 884728bc7d54cf9c865e3cdb0364280d855abe77
U 859402e221168ae1922da415f623cf2eef1afdcb
G 1aec78c47d215f6e93ea68a1207296bd113c2f44
";
        let first = parse_signature_log(log)
            .into_iter()
            .find(|c| c.status.is_verified())
            .unwrap();
        assert_eq!(first.oid, "859402e221168ae1922da415f623cf2eef1afdcb");
        assert_eq!(first.status, SignatureStatus::GoodUnknownTrust);
    }
}
