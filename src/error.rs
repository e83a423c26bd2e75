use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Persistent document error
///
/// Every variant carries a short `title` naming the failed operation and a
/// human-readable `reason`. Load and save errors also name their `origin`
/// (a file path, or `"string"` for in-memory input).
pub enum PersistError {
    /// Malformed input at load time. `line` holds the line for JSON input and
    /// the byte offset for XML input.
    #[error("{title} error: {reason} [{origin}:{line}]")]
    Parse {
        title: String,
        reason: String,
        origin: String,
        line: u64,
    },

    /// Input file could not be read.
    #[error("{title} error: {reason} [{origin}]")]
    Read {
        title: String,
        reason: String,
        origin: String,
    },

    /// Serialization or file write failure at save time.
    #[error("{title} error: {reason} [{origin}]")]
    Write {
        title: String,
        reason: String,
        origin: String,
    },

    /// The node addresses nothing: absent child, stale handle, or dropped document.
    #[error("{title} error: {reason}")]
    NullNode { title: String, reason: String },

    /// The addressed value does not have the requested shape.
    #[error("{title} error: {reason} ({name})")]
    TypeMismatch {
        title: String,
        reason: String,
        name: String,
    },

    /// An array-mode read ran past the last element.
    #[error("{title} error: no more items in array (position {position})")]
    ArrayExhausted { title: String, position: usize },
}

impl PersistError {
    pub(crate) fn parse(title: &str, reason: impl ToString, origin: &str, line: u64) -> Self {
        PersistError::Parse {
            title: title.to_string(),
            reason: reason.to_string(),
            origin: origin.to_string(),
            line,
        }
    }

    pub(crate) fn read(title: &str, reason: impl ToString, origin: &str) -> Self {
        PersistError::Read {
            title: title.to_string(),
            reason: reason.to_string(),
            origin: origin.to_string(),
        }
    }

    pub(crate) fn write(title: &str, reason: impl ToString, origin: &str) -> Self {
        PersistError::Write {
            title: title.to_string(),
            reason: reason.to_string(),
            origin: origin.to_string(),
        }
    }

    pub(crate) fn null_node(title: &str, reason: &str) -> Self {
        PersistError::NullNode {
            title: title.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn type_mismatch(title: &str, reason: &str, name: &str) -> Self {
        PersistError::TypeMismatch {
            title: title.to_string(),
            reason: reason.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn array_exhausted(title: &str, position: usize) -> Self {
        PersistError::ArrayExhausted {
            title: title.to_string(),
            position,
        }
    }

    /// Numeric status code of the error kind.
    pub fn status(&self) -> i32 {
        match self {
            PersistError::Parse { .. } => 1,
            PersistError::Read { .. } => 2,
            PersistError::Write { .. } => 3,
            PersistError::NullNode { .. } => 4,
            PersistError::TypeMismatch { .. } => 5,
            PersistError::ArrayExhausted { .. } => 6,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            PersistError::Parse { title, .. }
            | PersistError::Read { title, .. }
            | PersistError::Write { title, .. }
            | PersistError::NullNode { title, .. }
            | PersistError::TypeMismatch { title, .. }
            | PersistError::ArrayExhausted { title, .. } => title,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            PersistError::Parse { reason, .. }
            | PersistError::Read { reason, .. }
            | PersistError::Write { reason, .. }
            | PersistError::NullNode { reason, .. } => reason.clone(),
            PersistError::TypeMismatch { reason, name, .. } => format!("{reason} ({name})"),
            PersistError::ArrayExhausted { position, .. } => {
                format!("no more items in array (position {position})")
            }
        }
    }

    /// Where the error comes from: a file path, `"string"`, or empty.
    pub fn origin(&self) -> &str {
        match self {
            PersistError::Parse { origin, .. }
            | PersistError::Read { origin, .. }
            | PersistError::Write { origin, .. } => origin,
            _ => "",
        }
    }

    /// Line (JSON) or byte offset (XML) of a parse error, 0 otherwise.
    pub fn line(&self) -> u64 {
        match self {
            PersistError::Parse { line, .. } => *line,
            _ => 0,
        }
    }

    /// Builds a diagnostic string, either on one line or as a block of
    /// `Title:`/`Code:`/`Description:`/`Location:` lines.
    pub fn info(&self, multi_line: bool) -> String {
        let origin = self.origin();
        if !multi_line {
            let mut output = format!("{} error: {} (status={})", self.title(), self.reason(), self.status());
            if !origin.is_empty() {
                output.push_str(&format!(" [{}:{}]", origin, self.line()));
            }
            output
        } else {
            let mut output = format!("Title:       {}\n", self.title());
            output.push_str(&format!("Code:        {}\n", self.status()));
            output.push_str(&format!("Description: {}\n", self.reason()));
            if !origin.is_empty() {
                output.push_str(&format!("Location:    {}:{}\n", origin, self.line()));
            }
            output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_info_names_title_status_and_origin() {
        let error = PersistError::parse("json load from string", "unexpected end", "string", 3);

        assert_eq!(
            error.info(false),
            "json load from string error: unexpected end (status=1) [string:3]"
        );
    }

    #[test]
    fn multi_line_info_without_origin_has_no_location() {
        let error = PersistError::null_node("read number", "node has no target");
        let info = error.info(true);

        assert!(info.contains("Title:       read number\n"));
        assert!(info.contains("Code:        4\n"));
        assert!(info.contains("Description: node has no target\n"));
        assert!(!info.contains("Location:"));
    }

    #[test]
    fn status_codes_follow_the_error_kind() {
        assert_eq!(PersistError::read("load", "missing", "a.json").status(), 2);
        assert_eq!(PersistError::write("save", "denied", "a.json").status(), 3);
        assert_eq!(PersistError::type_mismatch("read array", "array expected", "x").status(), 5);
        assert_eq!(PersistError::array_exhausted("read number", 2).status(), 6);
    }

    #[test]
    fn display_matches_variant_format() {
        let error = PersistError::array_exhausted("read string", 4);
        assert_eq!(
            error.to_string(),
            "read string error: no more items in array (position 4)"
        );
        assert_eq!(error.reason(), "no more items in array (position 4)");
    }
}
