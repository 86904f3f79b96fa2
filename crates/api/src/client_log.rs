//! Append-only log of client error reports.
//!
//! One JSON object per line: `{"at": <RFC 3339 time>, "body": <report>}`.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

/// Number of trailing characters returned by [`read_tail`] for the admin view.
pub const LOG_TAIL_CHARS: usize = 20_000;

/// Append one report, creating the file if needed.
pub async fn append_report(path: &Path, body: &Value) -> std::io::Result<()> {
    let entry = json!({
        "at": chrono::Utc::now().to_rfc3339(),
        "body": body,
    });
    let mut line = entry.to_string();
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}

/// The last `max_chars` characters of the log. A missing file reads as empty.
pub async fn read_tail(path: &Path, max_chars: usize) -> std::io::Result<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(e),
    };
    let text = String::from_utf8_lossy(&bytes);

    let total = text.chars().count();
    if total <= max_chars {
        return Ok(text.into_owned());
    }
    Ok(text.chars().skip(total - max_chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tail = read_tail(&dir.path().join("absent.log"), 100).await.unwrap();
        assert_eq!(tail, "");
    }

    #[tokio::test]
    async fn appends_one_json_line_per_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.log");

        append_report(&path, &json!({ "message": "boom" })).await.unwrap();
        append_report(&path, &json!("plain")).await.unwrap();

        let text = read_tail(&path, LOG_TAIL_CHARS).await.unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["body"]["message"], "boom");
        assert_eq!(lines[1]["body"], "plain");
        assert!(lines[0]["at"].as_str().is_some());
    }

    #[tokio::test]
    async fn tail_counts_characters_not_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.log");
        tokio::fs::write(&path, "ab\u{0436}\u{0436}\u{0436}").await.unwrap();

        assert_eq!(read_tail(&path, 2).await.unwrap(), "\u{0436}\u{0436}");
        assert_eq!(read_tail(&path, 10).await.unwrap(), "ab\u{0436}\u{0436}\u{0436}");
    }
}
