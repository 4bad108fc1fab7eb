//! Literal, whitespace-anchored parsing of scanner textual output.
//!
//! This is a security requirement, not a style choice: matching must be
//! anchored to the scanner's trailing output lines, never by bare substring,
//! or a file named e.g. `0 threat(s) detected` could spoof a clean verdict.
//! The suspect pattern is always checked before the clean pattern.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawVerdict {
    Clean,
    Suspect,
    NotFound,
    Unparseable,
}

const SUSPECT_MARKER: &str = "Threat(s) found";
const NOT_FOUND_TRAILER: &str = "\n\t0 file(s) scanned\n\t0 threat(s) detected";
const CLEAN_TRAILER: &str = "\n\t0 threat(s) detected";

/// Parse a scanner's combined stdout against the literal anchored patterns.
pub fn parse_output(stdout: &str) -> RawVerdict {
    if stdout.contains(SUSPECT_MARKER) {
        return RawVerdict::Suspect;
    }
    if stdout.ends_with(NOT_FOUND_TRAILER) {
        return RawVerdict::NotFound;
    }
    if stdout.ends_with(CLEAN_TRAILER) {
        return RawVerdict::Clean;
    }
    RawVerdict::Unparseable
}
