/// Incremental text -> line splitter.
///
/// `\n`, `\r\n` and a lone `\r` all terminate a line; every emitted line
/// ends in a single `\n`. A `\r` at the end of the input seen so far is
/// held back until the next call shows whether a `\n` follows it.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: String,
    /// Prefix of `pending` already known to hold no line break
    scanned: usize,
}

impl LineDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` and return every line it completes.
    pub fn decode(&mut self, text: &str) -> Vec<String> {
        self.pending.push_str(text);

        let bytes = self.pending.as_bytes();
        let mut lines = Vec::new();
        let mut start = 0;
        let mut i = self.scanned;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    lines.push(terminated(&self.pending[start..i]));
                    i += 1;
                    start = i;
                }
                b'\r' if i + 1 == bytes.len() => break,
                b'\r' => {
                    lines.push(terminated(&self.pending[start..i]));
                    i += if bytes[i + 1] == b'\n' { 2 } else { 1 };
                    start = i;
                }
                _ => i += 1,
            }
        }

        self.pending.replace_range(..start, "");
        self.scanned = i - start;
        lines
    }

    /// Emit the pending partial line, if any.
    pub fn flush(&mut self) -> Vec<String> {
        self.scanned = 0;
        if self.pending.is_empty() {
            return Vec::new();
        }
        let mut line = std::mem::take(&mut self.pending);
        if line.ends_with('\r') {
            line.pop();
            line.push('\n');
        }
        vec![line]
    }
}

fn terminated(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 1);
    out.push_str(line);
    out.push('\n');
    out
}
