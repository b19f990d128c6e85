//! Kahn's algorithm over drafted operations.
//!
//! The ready set is keyed by draft position, so among operations whose
//! dependencies are all satisfied the earliest drafted goes first. An input
//! that is already in dependency order comes out unchanged.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use super::{Operation, OperationId, PlanError};

pub(super) fn topological(operations: Vec<Operation>) -> Result<Vec<Operation>, PlanError> {
    let mut index: HashMap<OperationId, usize> = HashMap::with_capacity(operations.len());
    for (position, operation) in operations.iter().enumerate() {
        if index.insert(operation.id(), position).is_some() {
            return Err(PlanError::DuplicateOperation {
                operation: operation.id(),
            });
        }
    }

    let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(operations.len());
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); operations.len()];
    for (position, operation) in operations.iter().enumerate() {
        let mut resolved = Vec::with_capacity(operation.depends_on.len());
        for dependency in &operation.depends_on {
            let Some(&target) = index.get(dependency) else {
                return Err(PlanError::UnknownDependency {
                    operation: operation.id(),
                    dependency: dependency.to_string(),
                });
            };
            resolved.push(target);
            dependents[target].push(position);
        }
        dependencies.push(resolved);
    }

    let mut pending: Vec<usize> = dependencies.iter().map(Vec::len).collect();
    let mut ready: BTreeSet<usize> = (0..operations.len())
        .filter(|&position| pending[position] == 0)
        .collect();

    let mut sorted = Vec::with_capacity(operations.len());
    while let Some(position) = ready.pop_first() {
        sorted.push(position);
        for &dependent in &dependents[position] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if sorted.len() < operations.len() {
        let cycle = find_cycle(&dependencies, &pending)
            .into_iter()
            .map(|position| operations[position].id())
            .collect();
        return Err(PlanError::CyclicPlan { cycle });
    }

    trace!("ordered {} operation(s)", sorted.len());
    let mut slots: Vec<Option<Operation>> = operations.into_iter().map(Some).collect();
    Ok(sorted
        .into_iter()
        .filter_map(|position| slots[position].take())
        .collect())
}

/// Every operation left unsorted still waits on another unsorted one, so
/// walking those edges from the earliest leftover must revisit a node.
fn find_cycle(dependencies: &[Vec<usize>], pending: &[usize]) -> Vec<usize> {
    let stuck = |position: usize| pending[position] > 0;

    let Some(mut current) = (0..pending.len()).find(|&position| stuck(position)) else {
        return Vec::new();
    };
    let mut path: Vec<usize> = Vec::new();
    loop {
        if let Some(start) = path.iter().position(|&seen| seen == current) {
            return path.split_off(start);
        }
        path.push(current);
        match dependencies[current].iter().copied().find(|&next| stuck(next)) {
            Some(next) => current = next,
            None => return path,
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
