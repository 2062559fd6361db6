//! Logging initialization for the smart proxy gateway binary.
//!
//! The gateway only ships structured logging: the vector store, lexical
//! index and dynamic-limit selector all emit `log` records through whichever
//! backend the binary installs here. There is no OpenTelemetry exporter or
//! distributed tracing in this build; `log::Record` key-values carry enough
//! context (namespace, tool id, score) for local debugging.

use logforth::append;

/// Installs a stderr logger filtered by `directive` (e.g. `"info"` or
/// `"smart_proxy=debug,config=warn"`).
///
/// Call once, near the top of `main`.
pub fn init(directive: &str) -> anyhow::Result<()> {
    logforth::builder()
        .dispatch(|d| d.filter(directive).append(append::Stderr::default()))
        .apply();

    Ok(())
}

/// Current UTC instant formatted the way the gateway's log lines report it.
///
/// Kept separate from the logger backend so other crates can stamp
/// ancillary timing fields consistently — used by the embedding client to
/// log when a request to the embeddings endpoint started.
pub fn now_utc() -> String {
    jiff::Zoned::now().strftime("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_accepts_a_filter_directive() {
        // Installing a second global logger in the same test binary errors;
        // we only assert the call itself doesn't panic building the layout.
        let _ = init("info");
    }

    #[test]
    fn now_utc_is_rfc3339_like() {
        let stamp = now_utc();
        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.len(), "2024-01-01T00:00:00.000Z".len());
    }
}
