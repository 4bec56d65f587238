use std::sync::atomic::{AtomicUsize, Ordering};

/// A single client-id/secret pair for the venue provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
}

/// Cycles through credential pairs in a fixed order so successive
/// requests spread across distinct quota buckets instead of draining one
/// bucket serially.
///
/// The cursor is process-local and resets only when the process restarts;
/// concurrent workers each keep their own rotator and need no
/// coordination.
#[derive(Debug)]
pub struct CredentialRotator {
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialRotator {
    /// `credentials` must contain at least one pair.
    pub fn new(credentials: Vec<Credential>) -> Self {
        assert!(
            !credentials.is_empty(),
            "credential rotator requires at least one credential pair"
        );
        Self {
            credentials,
            cursor: AtomicUsize::new(0),
        }
    }

    /// The next credential in the cycle. Never runs out.
    pub fn next(&self) -> Credential {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.credentials[index % self.credentials.len()].clone()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(id: &str) -> Credential {
        Credential {
            client_id: id.to_string(),
            client_secret: format!("{id}-secret"),
        }
    }

    #[test]
    fn cycles_in_fixed_order() {
        let rotator = CredentialRotator::new(vec![pair("a"), pair("b")]);

        assert_eq!(rotator.next().client_id, "a");
        assert_eq!(rotator.next().client_id, "b");
        assert_eq!(rotator.next().client_id, "a");
        assert_eq!(rotator.next().client_id, "b");
    }

    #[test]
    fn single_credential_repeats_forever() {
        let rotator = CredentialRotator::new(vec![pair("only")]);

        for _ in 0..5 {
            assert_eq!(rotator.next().client_id, "only");
        }
    }
}
