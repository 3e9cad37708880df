use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "one_twos";
const HTTP_SUBDIR: &str = "http";

// One file per URL: event files run to several megabytes each.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    url: String,
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// GET `url`, revalidating against the on-disk copy. `Ok(None)` means the server
/// answered 404 (open data has no 360 file for most matches).
pub fn fetch_text_cached(client: &Client, url: &str) -> Result<Option<String>> {
    let cached_entry = load_entry(url);

    let mut req = client.get(url);
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = match req.send() {
        Ok(resp) => resp,
        Err(err) => {
            // Offline runs can still use whatever was fetched before.
            if let Some(entry) = cached_entry {
                log::warn!("request for {url} failed ({err}); using cached copy");
                return Ok(Some(entry.body));
            }
            return Err(err).context("request failed");
        }
    };
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(entry) = cached_entry {
            return Ok(Some(entry.body));
        }
        return Err(anyhow!("received 304 without cache body"));
    }
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow!("http {}: {}", status, truncate(&body, 200)));
    }

    let etag = headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    let last_modified = headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let entry = CacheEntry {
        version: CACHE_VERSION,
        url: url.to_string(),
        body: body.clone(),
        etag,
        last_modified,
        fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
    };
    if let Err(err) = save_entry(&entry) {
        log::debug!("http cache write skipped for {url}: {err}");
    }
    Ok(Some(body))
}

/// `$XDG_CACHE_HOME/one_twos`, falling back to `~/.cache/one_twos`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn load_entry(url: &str) -> Option<CacheEntry> {
    let path = entry_path(url)?;
    let raw = fs::read_to_string(path).ok()?;
    let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;
    if entry.version != CACHE_VERSION || entry.url != url {
        return None;
    }
    Some(entry)
}

fn save_entry(entry: &CacheEntry) -> Result<()> {
    let Some(path) = entry_path(&entry.url) else {
        return Ok(());
    };
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).context("create http cache dir")?;
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(entry).context("serialize http cache entry")?;
    fs::write(&tmp, json).context("write http cache entry")?;
    fs::rename(&tmp, &path).context("swap http cache entry")?;
    Ok(())
}

fn entry_path(url: &str) -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(HTTP_SUBDIR).join(cache_file_name(url)))
}

fn cache_file_name(url: &str) -> String {
    let stripped = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let mut name: String = stripped
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    name.push_str(".json");
    name
}

fn truncate(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}
