use nix::unistd::Uid;

use crate::types::{Namespace, NamespaceFlags, Notice};

/// Namespaces every container gets, whatever was requested.
pub const DEFAULT_NAMESPACES: [Namespace; 3] = [Namespace::Ipc, Namespace::Pid, Namespace::Mount];

/// Append `ns` unless a namespace of that kind is already listed.
pub fn push_unique(namespaces: &mut Vec<Namespace>, ns: Namespace) -> bool {
    if namespaces.contains(&ns) {
        return false;
    }
    namespaces.push(ns);
    true
}

/// Namespaces to create for the requested `flags`.
///
/// `host_uid` is the host identity of the launching user: a non-root user always gets a
/// user namespace from the runtime, so only root adds one here.
pub fn compose(flags: NamespaceFlags, host_uid: Uid, notices: &mut Vec<Notice>) -> Vec<Namespace> {
    let mut namespaces = DEFAULT_NAMESPACES.to_vec();

    for always_on in [NamespaceFlags::IPC, NamespaceFlags::PID] {
        if flags.contains(always_on) {
            notices.push(Notice::RedundantNamespace { flag: always_on });
        }
    }

    if flags.contains(NamespaceFlags::NET) {
        push_unique(&mut namespaces, Namespace::Network);
    }
    if flags.contains(NamespaceFlags::USER) {
        if host_uid.is_root() {
            push_unique(&mut namespaces, Namespace::User);
        } else {
            notices.push(Notice::RedundantNamespace {
                flag: NamespaceFlags::USER,
            });
        }
    }
    if flags.contains(NamespaceFlags::UTS) {
        push_unique(&mut namespaces, Namespace::Uts);
    }

    log::debug!("namespaces: {namespaces:?}");
    namespaces
}
