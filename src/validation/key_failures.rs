use std::fmt;

/// One key that did not verify the signature.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct KeyFailure {
    key_id: Option<String>,
    error: String,
}

impl KeyFailure {
    /// Returns the identifier of the key that was tried.
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Returns the verification error for this key.
    pub fn error(&self) -> &str {
        &self.error
    }
}

/// Ordered record of the keys tried while verifying a signature.
///
/// Callers append one entry per candidate key; the log is then attached to a
/// [`SignatureKeyNotFoundError`](super::SignatureKeyNotFoundError).
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct KeyFailureLog {
    entries: Vec<KeyFailure>,
}

impl KeyFailureLog {
    /// Creates an empty log.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Records that the key `key_id` failed with `error`.
    pub fn record(&mut self, key_id: Option<&str>, error: impl fmt::Display) {
        self.entries.push(KeyFailure {
            key_id: key_id.map(str::to_owned),
            error: error.to_string(),
        });
    }

    /// Returns the entries in the order they were recorded.
    pub fn entries(&self) -> &[KeyFailure] {
        &self.entries
    }

    /// Returns the number of keys tried.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key was tried.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for KeyFailureLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("no keys were tried");
        }
        f.write_str("keys tried: ")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(
                f,
                "[{}] {}",
                entry.key_id.as_deref().unwrap_or("<no kid>"),
                entry.error
            )?;
        }
        Ok(())
    }
}
