//! Stage parser: free-form staging text to a structured TNM triple
//!
//! Input is cleaned by dropping everything that is not alphanumeric and
//! uppercasing. The cleaned text is then read left to right as a T token, an
//! N token and an M token. Each token is its prefix letter followed by a
//! digit, `IS` or `X`, with an optional `A`/`B` subdivision. An optional
//! clinical/pathological prefix (`c`, `p`, `yp`, `r`) before the T token is
//! skipped, and anything after the M token is ignored.

use tracing::{debug, warn};

use crate::core::error::StageParseError;
use crate::entities::staging::{MetastasisCategory, NodeCategory, TnmStaging, TumorCategory};

/// Fewer cleaned characters than this cannot name all three components
const MIN_CLEANED_LEN: usize = 6;

/// Parse a staging string such as `T3N1M0`, `T1aN0M0` or `ypT2 N1 M0`
pub fn parse_stage(raw: &str) -> Result<TnmStaging, StageParseError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase();

    if cleaned.is_empty() {
        return Err(StageParseError::Empty);
    }
    if cleaned.len() < MIN_CLEANED_LEN {
        return Err(StageParseError::TooShort {
            raw: raw.to_string(),
            len: cleaned.len(),
        });
    }

    let bytes = cleaned.as_bytes();
    let mut pos = skip_prefix(bytes);

    let (t_token, next) = read_token(bytes, pos, b'T');
    pos = next;
    let tumor = t_token
        .parse::<TumorCategory>()
        .map_err(|_| StageParseError::UnknownTumor {
            raw: raw.to_string(),
            token: t_token.clone(),
        })?;

    let (n_token, next) = read_token(bytes, pos, b'N');
    pos = next;
    let node = n_token
        .parse::<NodeCategory>()
        .map_err(|_| StageParseError::UnknownNode {
            raw: raw.to_string(),
            token: n_token.clone(),
        })?;

    let (m_token, next) = read_token(bytes, pos, b'M');
    pos = next;
    let metastasis =
        m_token
            .parse::<MetastasisCategory>()
            .map_err(|_| StageParseError::UnknownMetastasis {
                raw: raw.to_string(),
                token: m_token.clone(),
            })?;

    if pos < bytes.len() {
        debug!(input = raw, ignored = &cleaned[pos..], "text after staging ignored");
    }

    Ok(TnmStaging::new(tumor, node, metastasis))
}

/// Parse a staging string, substituting `default` on failure
///
/// The substitution is logged so that silently restaged records can be
/// traced back. Without a default the parse error is returned unchanged.
pub fn parse_stage_or(
    raw: &str,
    default: Option<TnmStaging>,
) -> Result<TnmStaging, StageParseError> {
    match (parse_stage(raw), default) {
        (Ok(staging), _) => Ok(staging),
        (Err(err), Some(fallback)) => {
            warn!(input = raw, error = %err, fallback = %fallback, "staging fallback applied");
            Ok(fallback)
        }
        (Err(err), None) => Err(err),
    }
}

/// Build a staging from discrete T, N and M fields
pub fn parse_stage_fields(
    tumor: &str,
    node: &str,
    metastasis: &str,
) -> Result<TnmStaging, StageParseError> {
    Ok(TnmStaging::new(
        tumor.parse()?,
        node.parse()?,
        metastasis.parse()?,
    ))
}

fn skip_prefix(bytes: &[u8]) -> usize {
    for prefix in [&b"YP"[..], b"C", b"P", b"R"] {
        if bytes.starts_with(prefix) && bytes.get(prefix.len()) == Some(&b'T') {
            return prefix.len();
        }
    }
    0
}

/// Read one component starting at `pos`; returns the token text and the
/// position after it. A token that does not start with `letter` consumes
/// nothing and comes back as the remaining text, which then fails to map.
fn read_token(bytes: &[u8], pos: usize, letter: u8) -> (String, usize) {
    if bytes.get(pos) != Some(&letter) {
        let rest = String::from_utf8_lossy(&bytes[pos.min(bytes.len())..]).into_owned();
        return (rest, pos);
    }
    let mut end = pos + 1;
    match bytes.get(end) {
        Some(b'I') if bytes.get(end + 1) == Some(&b'S') => end += 2,
        Some(b'X') => end += 1,
        Some(&digit) if digit.is_ascii_digit() => {
            end += 1;
            if subdivided(letter, digit) && matches!(bytes.get(end), Some(b'A') | Some(b'B')) {
                end += 1;
            }
        }
        _ => {}
    }
    (String::from_utf8_lossy(&bytes[pos..end]).into_owned(), end)
}

/// Categories that carry an a/b subdivision: T1, T4, N3 and M1
fn subdivided(letter: u8, digit: u8) -> bool {
    matches!((letter, digit), (b'T', b'1' | b'4') | (b'N', b'3') | (b'M', b'1'))
}
