use std::fmt;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;

pub const SUBUID_PATH: &str = "/etc/subuid";
pub const SUBGID_PATH: &str = "/etc/subgid";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SubIdKind {
    Uid,
    Gid,
}

impl fmt::Display for SubIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubIdKind::Uid => f.write_str("subuid"),
            SubIdKind::Gid => f.write_str("subgid"),
        }
    }
}

/// A contiguous block of subordinate IDs allocated to one user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SubIdRange {
    pub start: u32,
    pub size: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SubIdError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no {kind} range for user {user} in {}", path.display())]
    NoEntry {
        kind: SubIdKind,
        user: String,
        path: PathBuf,
    },
    #[error("malformed {kind} entry on line {line} of {}", path.display())]
    Malformed {
        kind: SubIdKind,
        line: usize,
        path: PathBuf,
    },
}

/// Find the range for a user in the content of a subuid/subgid file.
///
/// An entry matches on either the user name or the decimal uid; the first match wins.
pub fn parse_subid(
    content: &[u8],
    path: &Path,
    kind: SubIdKind,
    user: Option<&str>,
    uid: u32,
) -> Result<SubIdRange, SubIdError> {
    let uid_str = uid.to_string();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(b"#") {
            continue;
        }
        let Some((name, rest)) = line.split_once_str(b":") else {
            continue;
        };
        let name = name.trim();
        if name != uid_str.as_bytes() && user.map(str::as_bytes) != Some(name) {
            continue;
        }

        let malformed = || SubIdError::Malformed {
            kind,
            line: idx + 1,
            path: path.to_path_buf(),
        };
        let (start, size) = rest.split_once_str(b":").ok_or_else(malformed)?;
        let start = parse_id(start).ok_or_else(malformed)?;
        let size = parse_id(size).ok_or_else(malformed)?;
        return Ok(SubIdRange { start, size });
    }

    Err(SubIdError::NoEntry {
        kind,
        user: user.map(str::to_owned).unwrap_or(uid_str),
        path: path.to_path_buf(),
    })
}

fn parse_id(field: &[u8]) -> Option<u32> {
    field.trim().to_str().ok()?.parse().ok()
}

pub fn lookup_subid(
    path: impl AsRef<Path>,
    kind: SubIdKind,
    user: Option<&str>,
    uid: u32,
) -> Result<SubIdRange, SubIdError> {
    fn lookup_subid_inner(
        path: &Path,
        kind: SubIdKind,
        user: Option<&str>,
        uid: u32,
    ) -> Result<SubIdRange, SubIdError> {
        let content = std::fs::read(path).map_err(|source| SubIdError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let range = parse_subid(&content, path, kind, user, uid)?;
        log::debug!(
            "{kind} range for uid {uid} from {}: {range:?}",
            path.display()
        );
        Ok(range)
    }

    lookup_subid_inner(path.as_ref(), kind, user, uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBUID: &[u8] = b"# allocated by useradd\n\
        alice:100000:65536\n\
        \n\
        bob:165536:65536\n\
        1003:231072:1000\n\
        broken:12x:65536\n";

    fn parse(user: Option<&str>, uid: u32) -> Result<SubIdRange, SubIdError> {
        parse_subid(SUBUID, Path::new(SUBUID_PATH), SubIdKind::Uid, user, uid)
    }

    #[test]
    fn finds_by_name() {
        let range = parse(Some("bob"), 1002).unwrap();
        assert_eq!(
            range,
            SubIdRange {
                start: 165536,
                size: 65536
            }
        );
    }

    #[test]
    fn finds_by_uid() {
        let range = parse(None, 1003).unwrap();
        assert_eq!(
            range,
            SubIdRange {
                start: 231072,
                size: 1000
            }
        );
        let range = parse(Some("carol"), 1003).unwrap();
        assert_eq!(range.size, 1000);
    }

    #[test]
    fn missing_user() {
        let err = parse(Some("dave"), 1004).unwrap_err();
        assert!(matches!(err, SubIdError::NoEntry { ref user, .. } if user == "dave"));
        assert!(err.to_string().contains("/etc/subuid"));
    }

    #[test]
    fn malformed_matching_line() {
        let err = parse(Some("broken"), 1005).unwrap_err();
        assert!(matches!(err, SubIdError::Malformed { line: 6, .. }));
    }

    #[test]
    fn unreadable_file() {
        let err = lookup_subid(
            "/nonexistent/ocilaunch/subuid",
            SubIdKind::Uid,
            Some("alice"),
            1000,
        )
        .unwrap_err();
        assert!(matches!(err, SubIdError::Read { .. }));
    }
}
