//! Reverse ID mappings for launching from inside a fake-root user namespace.
//!
//! The fake-root namespace maps the host user to 0 and its subordinate range to
//! `1..=size`. The tables built here map the container's target identity back onto
//! that 0, so the target user (not generic root) owns what the host user owns, while
//! keeping the rest of the range usable inside the container.

use serde::{Deserialize, Serialize};

use crate::subid::{SubIdKind, SubIdRange};

/// Smallest subordinate range that still covers 0..=65535, `nobody` included.
pub const MIN_SUB_ID_RANGE: u32 = 65536;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct IdMapping {
    #[serde(rename = "containerID")]
    pub container_id: u32,
    #[serde(rename = "hostID")]
    pub host_id: u32,
    pub size: u32,
}

impl IdMapping {
    pub fn contains(&self, container_id: u32) -> bool {
        container_id >= self.container_id && container_id - self.container_id < self.size
    }

    pub fn resolve(&self, container_id: u32) -> Option<u32> {
        if !self.contains(container_id) {
            return None;
        }
        self.host_id.checked_add(container_id - self.container_id)
    }
}

/// Ordered mapping table; the first entry containing an id decides where it maps.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdMap(Vec<IdMapping>);

impl IdMap {
    pub fn entries(&self) -> &[IdMapping] {
        &self.0
    }

    pub fn resolve(&self, container_id: u32) -> Option<u32> {
        self.0.iter().find_map(|entry| entry.resolve(container_id))
    }

    // Empty ranges are never emitted.
    fn push(&mut self, container_id: u32, host_id: u32, size: u32) {
        if size > 0 {
            self.0.push(IdMapping {
                container_id,
                host_id,
                size,
            });
        }
    }
}

impl From<IdMap> for Vec<IdMapping> {
    fn from(map: IdMap) -> Self {
        map.0
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum IdMapError {
    #[error("{kind} range size ({size}) must be at least {required}")]
    RangeTooSmall {
        kind: SubIdKind,
        size: u32,
        required: u32,
    },
}

/// Build the table presenting `target` as the owner of fake-root's host id 0.
///
/// When `target` lies inside the range, ids below it shift up by one, `target` takes
/// host 0 and ids above it pass straight through. Otherwise the whole range shifts up
/// by one and only `target` itself is mapped outside of it.
pub fn reverse_map_by_range(target: u32, range_size: u32) -> IdMap {
    let mut map = IdMap::default();
    if target < range_size {
        map.push(0, 1, target);
        map.push(target, 0, 1);
        map.push(target + 1, target + 1, range_size - target - 1);
    } else {
        // Ids between range_size and target stay unmapped.
        map.push(0, 1, range_size);
        map.push(target, 0, 1);
    }
    map
}

pub fn reverse_map(kind: SubIdKind, target: u32, range: SubIdRange) -> Result<IdMap, IdMapError> {
    check_range(kind, range)?;
    Ok(reverse_map_by_range(target, range.size))
}

fn check_range(kind: SubIdKind, range: SubIdRange) -> Result<(), IdMapError> {
    if range.size < MIN_SUB_ID_RANGE {
        return Err(IdMapError::RangeTooSmall {
            kind,
            size: range.size,
            required: MIN_SUB_ID_RANGE,
        });
    }
    Ok(())
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReverseMaps {
    pub uid_map: IdMap,
    pub gid_map: IdMap,
}

/// Compute uid and gid tables re-mapping container root to `target_uid`/`target_gid`.
///
/// Both ranges are checked before anything is computed.
pub fn reverse_user_maps(
    target_uid: u32,
    target_gid: u32,
    subuid: SubIdRange,
    subgid: SubIdRange,
) -> Result<ReverseMaps, IdMapError> {
    check_range(SubIdKind::Uid, subuid)?;
    check_range(SubIdKind::Gid, subgid)?;
    let maps = ReverseMaps {
        uid_map: reverse_map_by_range(target_uid, subuid.size),
        gid_map: reverse_map_by_range(target_gid, subgid.size),
    };
    if target_uid >= subuid.size || target_gid >= subgid.size {
        log::warn!(
            "target identity {target_uid}:{target_gid} lies outside the subordinate id range, \
             ids between the range end and the target are left unmapped"
        );
    }
    Ok(maps)
}
