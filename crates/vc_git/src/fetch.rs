use std::thread;

/// How the next fetch widens visible history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    /// First fetch: an absolute shallow depth counting from the remote tip.
    Initial { depth: u32 },
    /// Later fetches: extend the existing shallow history by this many
    /// additional commits.
    Deepen { by: u32 },
}

/// Raw transport transcript of one fetch, as printed on stderr.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    transcript: String,
}

impl FetchOutcome {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
        }
    }

    /// True when the remote's object-count trailer reports that nothing was
    /// transferred. The grammar is a `remote:` line whose `Total` count is
    /// zero, e.g.
    ///
    /// ```text
    /// remote: Total 0 (delta 0), reused 0 (delta 0), pack-reused 0
    /// ```
    pub fn no_new_objects(&self) -> bool {
        self.transcript.lines().any(|line| {
            let Some(rest) = line.trim_start().strip_prefix("remote:") else {
                return false;
            };
            let mut words = rest.split_whitespace();
            while let Some(word) = words.next() {
                if word == "Total" {
                    return words.next().map(|n| n.trim_end_matches(',')) == Some("0");
                }
            }
            false
        })
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

/// Advisory parallelism hint for the fetch transport: one job per core minus
/// one for the driving process, minimum one.
pub fn fetch_jobs() -> u32 {
    match thread::available_parallelism() {
        Ok(n) if n.get() >= 3 => n.get() as u32 - 1,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_empty_transfer() {
        let transcript = "\
remote: Total 0 (delta 0), reused 0 (delta 0), pack-reused 0
warning: fetch normally indicates which branches had a forced update,
but that check has been disabled; to re-enable, use '--show-forced-updates'
";
        assert!(FetchOutcome::new(transcript).no_new_objects());
    }

    #[test]
    fn test_transfer_with_objects() {
        let transcript = "\
remote: Enumerating objects: 6, done.
remote: Counting objects: 100% (6/6), done.
remote: Compressing objects: 100% (2/2), done.
remote: Total 6 (delta 0), reused 0 (delta 0), pack-reused 0
From file:///tmp/src
 * [new branch]      main       -> origin/main
";
        assert!(!FetchOutcome::new(transcript).no_new_objects());
    }

    #[test]
    fn test_zero_counts_elsewhere_do_not_match() {
        // Only the `Total` counter decides; deltas and reuse counts of zero
        // are routine on any fetch.
        let transcript = "remote: Total 12 (delta 0), reused 0 (delta 0), pack-reused 0";
        assert!(!FetchOutcome::new(transcript).no_new_objects());
    }

    #[test]
    fn test_total_outside_remote_line_is_ignored() {
        let transcript = "warning: Total 0 mentioned by something else";
        assert!(!FetchOutcome::new(transcript).no_new_objects());
    }

    #[test]
    fn test_empty_transcript() {
        assert!(!FetchOutcome::new("").no_new_objects());
    }

    #[test]
    fn test_fetch_jobs_at_least_one() {
        assert!(fetch_jobs() >= 1);
    }
}
