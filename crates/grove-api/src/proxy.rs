//! Proxy-list plumbing: one proxy URL per line, assigned to accounts by
//! position.

use std::io;
use std::path::Path;

/// Read proxy URLs from a file; blank lines and `#` comments are skipped.
pub fn load_proxies(path: &Path) -> io::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Stable round-robin assignment by account position. `None` when the list
/// is empty so the account falls back to a direct connection.
pub fn assign_proxy(proxies: &[String], account_index: usize) -> Option<&str> {
    if proxies.is_empty() {
        None
    } else {
        Some(proxies[account_index % proxies.len()].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_proxy_file(name: &str, contents: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("grove_{name}_{nanos}.txt"));
        std::fs::write(&path, contents).expect("write proxy file");
        path
    }

    #[test]
    fn loads_proxies_skipping_blanks_and_comments() {
        let path = temp_proxy_file(
            "proxies",
            "socks5://10.0.0.1:1080\n\n# backup pool\nhttp://10.0.0.2:8080\n",
        );
        let proxies = load_proxies(&path).expect("load proxies");
        assert_eq!(
            proxies,
            vec![
                "socks5://10.0.0.1:1080".to_string(),
                "http://10.0.0.2:8080".to_string()
            ]
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn assignment_wraps_around_the_list() {
        let proxies = vec!["a".to_string(), "b".to_string()];
        assert_eq!(assign_proxy(&proxies, 0), Some("a"));
        assert_eq!(assign_proxy(&proxies, 1), Some("b"));
        assert_eq!(assign_proxy(&proxies, 2), Some("a"));
        assert_eq!(assign_proxy(&[], 0), None);
    }
}
