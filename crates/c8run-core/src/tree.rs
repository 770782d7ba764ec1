//! Process tree resolution shared by the platform launchers.

use std::collections::{HashMap, HashSet};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::process::ProcessId;

/// Re-read the process table, dropping processes that have exited
pub fn refresh(system: &mut System) {
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing(),
    );
}

/// Live processes as `(pid, parent)` pairs. Threads and zombies are skipped.
pub fn live_edges(system: &System) -> Vec<(u32, Option<u32>)> {
    system
        .processes()
        .iter()
        .filter(|(_, process)| {
            process.thread_kind().is_none()
                && process.status() != sysinfo::ProcessStatus::Zombie
        })
        .map(|(pid, process)| (pid.as_u32(), process.parent().map(|p| p.as_u32())))
        .collect()
}

pub fn is_alive(system: &System, pid: ProcessId) -> bool {
    system.process(Pid::from_u32(pid.0)).is_some_and(|process| {
        process.thread_kind().is_none() && process.status() != sysinfo::ProcessStatus::Zombie
    })
}

/// `root` and all of its descendants, deepest first; empty if `root` is not live
pub fn process_tree(system: &System, root: ProcessId) -> Vec<ProcessId> {
    tree_from_edges(root, &live_edges(system))
}

pub fn tree_from_edges(root: ProcessId, edges: &[(u32, Option<u32>)]) -> Vec<ProcessId> {
    if !edges.iter().any(|(pid, _)| *pid == root.0) {
        return Vec::new();
    }

    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for (pid, parent) in edges {
        if let Some(parent) = parent {
            children.entry(*parent).or_default().push(*pid);
        }
    }

    let mut tree = Vec::new();
    let mut visited = HashSet::from([root.0]);
    collect_descendants(root.0, &children, &mut visited, &mut tree);
    tree.push(root);
    tree
}

fn collect_descendants(
    parent: u32,
    children: &HashMap<u32, Vec<u32>>,
    visited: &mut HashSet<u32>,
    result: &mut Vec<ProcessId>,
) {
    let Some(direct) = children.get(&parent) else {
        return;
    };
    for &child in direct {
        // pid reuse can produce cycles in a racy snapshot
        if !visited.insert(child) {
            continue;
        }
        // Recursively find grandchildren first
        collect_descendants(child, children, visited, result);
        result.push(ProcessId(child));
    }
}
