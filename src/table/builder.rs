//! Clause-level view of a `CREATE TABLE` statement.
//!
//! The statement is held as three parts:
//! - the header up to and including the opening parenthesis
//! - the raw clause fragments of the column list, in order
//! - the table options following the closing parenthesis
//!
//! Fragments keep their original whitespace, so rendering an unmodified
//! builder reproduces the input byte for byte.

/// Ordered clause fragments of one `CREATE TABLE` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableBuilder {
    header: String,
    clauses: Vec<String>,
    /// Whitespace between the last clause and the closing parenthesis
    closing: String,
    /// Everything after the closing parenthesis, e.g. ` ENGINE=MyISAM;`
    options: String,
}

impl CreateTableBuilder {
    /// Split a statement around its column list.
    ///
    /// Returns `None` when there is no balanced parenthesised column list.
    pub fn parse(stmt: &str) -> Option<Self> {
        let (open, close, separators) = scan_column_list(stmt)?;

        let inner = &stmt[open + 1..close];
        let mut clauses = Vec::with_capacity(separators.len() + 1);
        let mut start = open + 1;
        for sep in separators {
            clauses.push(stmt[start..sep].to_string());
            start = sep + 1;
        }

        let last = &stmt[start..close];
        let trimmed = last.trim_end();
        let closing = last[trimmed.len()..].to_string();

        if inner.trim().is_empty() {
            clauses.clear();
        } else {
            clauses.push(trimmed.to_string());
        }

        Some(Self {
            header: stmt[..=open].to_string(),
            clauses,
            closing,
            options: stmt[close + 1..].to_string(),
        })
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    /// Append a raw clause fragment to the column list
    pub fn push_clause(&mut self, clause: impl Into<String>) {
        self.clauses.push(clause.into());
    }

    /// Append a `FOREIGN KEY` constraint on its own line
    pub fn foreign_key(&mut self, column: &str, referenced_table: &str) {
        self.push_clause(format!(
            "\nFOREIGN KEY ({}) REFERENCES {}({})",
            column, referenced_table, column
        ));
    }

    /// Replace a literal marker in the table options
    pub fn replace_engine(&mut self, from: &str, to: &str) {
        self.options = self.options.replace(from, to);
    }

    pub fn build(&self) -> String {
        let mut out = String::with_capacity(
            self.header.len()
                + self.closing.len()
                + self.options.len()
                + self.clauses.iter().map(|c| c.len() + 1).sum::<usize>()
                + 1,
        );
        out.push_str(&self.header);
        out.push_str(&self.clauses.join(","));
        out.push_str(&self.closing);
        out.push(')');
        out.push_str(&self.options);
        out
    }
}

/// Locate the column list: byte offsets of the opening and matching closing
/// parenthesis, plus the depth-1 commas between them.
fn scan_column_list(stmt: &str) -> Option<(usize, usize, Vec<usize>)> {
    let bytes = stmt.as_bytes();
    let mut depth = 0usize;
    let mut open = None;
    let mut separators = Vec::new();
    let mut quote: Option<u8> = None;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if let Some(q) = quote {
            if b == b'\\' && q == b'\'' {
                escape_next = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'\'' | b'`' => quote = Some(b),
            b'(' => {
                if depth == 0 {
                    open = Some(i);
                }
                depth += 1;
            }
            b')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return open.map(|o| (o, i, separators));
                }
            }
            b',' if depth == 1 => separators.push(i),
            _ => {}
        }
    }

    None
}
