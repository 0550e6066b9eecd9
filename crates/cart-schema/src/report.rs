use std::fmt;

/// One failed check, located by a JSON-pointer-like path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaIssue {
    /// `/` for the document root, else `/guidelines/0/cellColor` style.
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Outcome of running one validator over one payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    /// Name of the validator that produced the report.
    pub validator: String,
    pub issues: Vec<SchemaIssue>,
}

impl ValidationReport {
    pub fn new(validator: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            issues: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(SchemaIssue::new(path, message));
    }

    /// Issues with `prefix` put in front of every path, e.g. `cart.json/model`.
    pub fn prefixed(&self, prefix: &str) -> Vec<SchemaIssue> {
        self.issues
            .iter()
            .map(|issue| {
                let path = if issue.path == "/" {
                    prefix.to_string()
                } else {
                    format!("{prefix}{}", issue.path)
                };
                SchemaIssue::new(path, issue.message.clone())
            })
            .collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "{}: ok", self.validator);
        }
        write!(f, "{}: {} issue(s)", self.validator, self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

/// Append `key` to a pointer path, escaping `~` and `/` as JSON pointers do.
pub(crate) fn join(parent: &str, key: &str) -> String {
    let key = key.replace('~', "~0").replace('/', "~1");
    if parent == "/" {
        format!("/{key}")
    } else {
        format!("{parent}/{key}")
    }
}
