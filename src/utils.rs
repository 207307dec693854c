use std::path::Path;

/// Determines the MIME type of a file based on its extension.
/// Covers common notebook and model artifacts, falls back to mime_guess.
pub fn get_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "ipynb" => "application/x-ipynb+json",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "jsonl" => "application/jsonl",
        "log" => "text/plain",
        "safetensors" | "bin" | "pt" | "ckpt" => "application/octet-stream",
        _ => mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream"),
    }
}

/// Validates an S3 bucket name.
/// Returns an error message if invalid, or None if valid.
pub fn validate_bucket_name(bucket: &str) -> Option<String> {
    if bucket.trim().is_empty() {
        return Some("Bucket name must not be empty".to_string());
    }
    // AWS rules: 3-63 chars, lowercase, digits, dots and hyphens
    if bucket.len() < 3
        || bucket.len() > 63
        || !bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
        || bucket.starts_with(['-', '.'])
        || bucket.ends_with(['-', '.'])
    {
        return Some(format!(
            "Invalid bucket name '{}' (3-63 chars: lowercase letters, digits, '-' and '.')",
            bucket
        ));
    }
    None
}

/// Converts a relative local path into forward-slash form.
pub fn to_remote_relative(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .trim_start_matches('/')
        .to_string()
}

/// Joins a remote directory and a relative name with a single `/`.
pub fn join_remote(remote_dir: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        remote_dir.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Maps a remote path onto an object key (keys carry no leading slash).
pub fn remote_path_to_key(remote_path: &str) -> &str {
    remote_path.trim_start_matches('/')
}
