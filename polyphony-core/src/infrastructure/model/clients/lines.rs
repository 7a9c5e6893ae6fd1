//! Line-oriented consumption of streamed response bodies.
//!
//! Both the NDJSON proxy endpoint and SSE-style vendor streams frame text
//! fragments as newline-delimited records; the transport below splits the
//! byte stream into complete lines and leaves framing to the caller.

use futures::StreamExt;
use reqwest::Response;

use crate::infrastructure::model::types::ProviderError;

/// Feeds each complete, non-blank line of the response body to `handle`.
///
/// A body that ends without any data at all is a hard failure
/// ([`ProviderError::MissingBody`]); a trailing partial line is flushed as a
/// final record.
pub async fn for_each_line<F>(
    provider: &str,
    response: Response,
    mut handle: F,
) -> Result<(), ProviderError>
where
    F: FnMut(&str),
{
    let mut body = response.bytes_stream();
    let mut pending = String::new();
    let mut saw_data = false;

    while let Some(next) = body.next().await {
        let bytes = next.map_err(|e| ProviderError::network(provider, e))?;
        if bytes.is_empty() {
            continue;
        }
        saw_data = true;
        pending.push_str(&String::from_utf8_lossy(&bytes));

        while let Some(pos) = pending.find('\n') {
            let line: String = pending.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.trim().is_empty() {
                handle(line);
            }
        }
    }

    if !saw_data {
        return Err(ProviderError::missing_body(provider));
    }
    if !pending.trim().is_empty() {
        handle(pending.trim());
    }
    Ok(())
}
