use caps::{Capability, CapsHashSet};

use crate::host::{HostError, HostState};
use crate::types::{CapList, LaunchOptions, Notice};

/// Capabilities granted when neither `keep_privileges` nor `no_privileges` is asked for.
pub const DEFAULT_CAPS: [Capability; 14] = [
    Capability::CAP_CHOWN,
    Capability::CAP_DAC_OVERRIDE,
    Capability::CAP_FSETID,
    Capability::CAP_FOWNER,
    Capability::CAP_MKNOD,
    Capability::CAP_NET_RAW,
    Capability::CAP_SETGID,
    Capability::CAP_SETUID,
    Capability::CAP_SETFCAP,
    Capability::CAP_SETPCAP,
    Capability::CAP_NET_BIND_SERVICE,
    Capability::CAP_SYS_CHROOT,
    Capability::CAP_KILL,
    Capability::CAP_AUDIT_WRITE,
];

/// The five capability sets of the container process.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CapabilitySet {
    pub permitted: CapsHashSet,
    pub effective: CapsHashSet,
    pub inheritable: CapsHashSet,
    pub bounding: CapsHashSet,
    pub ambient: CapsHashSet,
}

/// Capabilities of `set` ordered by number.
pub fn sorted(set: &CapsHashSet) -> Vec<Capability> {
    let mut caps: Vec<Capability> = set.iter().copied().collect();
    caps.sort_by_key(|cap| cap.index());
    caps
}

/// `CAP_*` names of `set` ordered by capability number.
pub fn sorted_names(set: &CapsHashSet) -> Vec<String> {
    sorted(set).iter().map(|cap| cap.to_string()).collect()
}

fn push_unique(caps: &mut Vec<Capability>, cap: Capability) {
    if !caps.contains(&cap) {
        caps.push(cap);
    }
}

/// Parse user supplied capability names.
///
/// Entries may hold several comma separated names. Names are case insensitive and the
/// `CAP_` prefix is optional; `ALL` stands for every capability. Unknown names are
/// reported as notices and skipped.
pub fn parse_cap_list(
    list: CapList,
    entries: &[String],
    notices: &mut Vec<Notice>,
) -> Vec<Capability> {
    let mut caps = Vec::new();
    for token in entries.iter().flat_map(|entry| entry.split(',')) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let upper = token.to_ascii_uppercase();
        if upper == "ALL" {
            for cap in sorted(&caps::all()) {
                push_unique(&mut caps, cap);
            }
            continue;
        }
        let name = if upper.starts_with("CAP_") {
            upper
        } else {
            format!("CAP_{upper}")
        };
        match name.parse::<Capability>() {
            Ok(cap) => push_unique(&mut caps, cap),
            Err(_) => notices.push(Notice::UnknownCapability {
                list,
                name: token.to_owned(),
            }),
        }
    }
    caps
}

/// Capabilities available before `add_caps` and `drop_caps` are applied.
pub fn base_caps<H: HostState + ?Sized>(
    options: &LaunchOptions,
    host: &H,
) -> Result<CapsHashSet, HostError> {
    if options.no_privileges {
        return Ok(CapsHashSet::new());
    }
    if options.keep_privileges {
        return host.effective_caps();
    }
    Ok(DEFAULT_CAPS.into_iter().collect())
}

/// Compute the capability sets from a base set and the requested additions and removals.
///
/// Root in the container holds the whole bounding set. Any other user only ever holds
/// what was explicitly added, with the bounding set as its ceiling.
pub fn resolve_with_base(
    base: CapsHashSet,
    add: &[Capability],
    drop: &[Capability],
    target_uid: u32,
) -> CapabilitySet {
    let mut bounding = base;
    bounding.extend(add.iter().copied());
    for cap in drop {
        bounding.remove(cap);
    }

    if target_uid == 0 {
        return CapabilitySet {
            permitted: bounding.clone(),
            effective: bounding.clone(),
            inheritable: CapsHashSet::new(),
            bounding,
            ambient: CapsHashSet::new(),
        };
    }

    let explicit: CapsHashSet = add
        .iter()
        .filter(|cap| !drop.contains(cap))
        .copied()
        .collect();
    CapabilitySet {
        permitted: explicit.clone(),
        effective: explicit.clone(),
        inheritable: explicit.clone(),
        bounding,
        ambient: explicit,
    }
}

pub fn resolve<H: HostState + ?Sized>(
    options: &LaunchOptions,
    host: &H,
    target_uid: u32,
    notices: &mut Vec<Notice>,
) -> Result<CapabilitySet, HostError> {
    let base = base_caps(options, host)?;
    let add = parse_cap_list(CapList::Add, &options.add_caps, notices);
    let drop = parse_cap_list(CapList::Drop, &options.drop_caps, notices);
    let set = resolve_with_base(base, &add, &drop, target_uid);
    log::debug!(
        "capabilities for uid {target_uid}: bounding {:?}, effective {:?}",
        sorted_names(&set.bounding),
        sorted_names(&set.effective)
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FixedHost;

    fn set(caps: &[Capability]) -> CapsHashSet {
        caps.iter().copied().collect()
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn name_normalization() {
        let mut notices = Vec::new();
        let caps = parse_cap_list(
            CapList::Add,
            &strings(&["chown, cap_kill,Sys_Admin", "CAP_CHOWN", "bogus,"]),
            &mut notices,
        );
        assert_eq!(
            caps,
            [
                Capability::CAP_CHOWN,
                Capability::CAP_KILL,
                Capability::CAP_SYS_ADMIN
            ]
        );
        assert_eq!(
            notices,
            [Notice::UnknownCapability {
                list: CapList::Add,
                name: "bogus".to_owned()
            }]
        );
        assert_eq!(notices[0].to_string(), "Ignoring unknown --add-caps: bogus");
    }

    #[test]
    fn all_expands() {
        let mut notices = Vec::new();
        let caps = parse_cap_list(CapList::Drop, &strings(&["all"]), &mut notices);
        assert_eq!(set(&caps), caps::all());
        assert!(notices.is_empty());
    }

    #[test]
    fn default_root() {
        let host = FixedHost::new(0, 0);
        let mut notices = Vec::new();
        let caps = resolve(&LaunchOptions::default(), &host, 0, &mut notices).unwrap();
        assert_eq!(caps.bounding, set(&DEFAULT_CAPS));
        assert_eq!(caps.permitted, caps.bounding);
        assert_eq!(caps.effective, caps.bounding);
        assert!(caps.inheritable.is_empty());
        assert!(caps.ambient.is_empty());
    }

    #[test]
    fn base_policy() {
        let mut host = FixedHost::new(0, 0);
        host.effective_caps = set(&[Capability::CAP_SYS_ADMIN]);

        let mut options = LaunchOptions::default();
        assert_eq!(base_caps(&options, &host).unwrap(), set(&DEFAULT_CAPS));

        options.keep_privileges = true;
        assert_eq!(
            base_caps(&options, &host).unwrap(),
            set(&[Capability::CAP_SYS_ADMIN])
        );

        options.no_privileges = true;
        assert!(base_caps(&options, &host).unwrap().is_empty());
    }

    #[test]
    fn drop_beats_add() {
        let caps = resolve_with_base(
            set(&DEFAULT_CAPS),
            &[Capability::CAP_SYS_ADMIN, Capability::CAP_KILL],
            &[Capability::CAP_KILL, Capability::CAP_CHOWN],
            0,
        );
        assert!(caps.bounding.contains(&Capability::CAP_SYS_ADMIN));
        assert!(!caps.bounding.contains(&Capability::CAP_KILL));
        assert!(!caps.bounding.contains(&Capability::CAP_CHOWN));
    }

    #[test]
    fn non_root_only_holds_explicit_caps() {
        let pool = [
            Capability::CAP_CHOWN,
            Capability::CAP_KILL,
            Capability::CAP_SYS_ADMIN,
            Capability::CAP_NET_ADMIN,
        ];
        let bases = [CapsHashSet::new(), set(&DEFAULT_CAPS), caps::all()];
        for base in &bases {
            for add_mask in 0..16u32 {
                for drop_mask in 0..16u32 {
                    let pick = |mask: u32| -> Vec<Capability> {
                        (0..pool.len())
                            .filter(|i| mask & (1 << i) != 0)
                            .map(|i| pool[i])
                            .collect()
                    };
                    let add = pick(add_mask);
                    let drop = pick(drop_mask);

                    let caps = resolve_with_base(base.clone(), &add, &drop, 1000);
                    let explicit: CapsHashSet =
                        add.iter().filter(|c| !drop.contains(c)).copied().collect();
                    assert_eq!(caps.permitted, explicit);
                    assert_eq!(caps.effective, explicit);
                    assert_eq!(caps.inheritable, explicit);
                    assert_eq!(caps.ambient, explicit);
                    assert!(explicit.is_subset(&caps.bounding));

                    let root = resolve_with_base(base.clone(), &add, &drop, 0);
                    assert_eq!(root.permitted, root.bounding);
                    assert_eq!(root.effective, root.bounding);
                    assert_eq!(root.bounding, caps.bounding);
                }
            }
        }
    }

    #[test]
    fn names_are_sorted() {
        let names = sorted_names(&set(&[
            Capability::CAP_KILL,
            Capability::CAP_CHOWN,
            Capability::CAP_SETUID,
        ]));
        assert_eq!(names, ["CAP_CHOWN", "CAP_KILL", "CAP_SETUID"]);
    }
}
