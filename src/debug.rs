//! Dev-only diagnostics: the logging gate and anonymized item ids.
//!
//! Free-text answers are personal; logs only ever carry a short hash.

/// Env switch for verbose clustering narration.
pub const ENV_DEV_LOG: &str = "FLOW_DEV_LOG";

// Dev logging gate: FLOW_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    is_dev_shuttle_env()
}

pub fn is_dev_shuttle_env() -> bool {
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// First 6 bytes of SHA-256 as hex.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}
