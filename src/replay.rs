//! Replays a trace against a [`ChainedHashMap`] and a `std` reference map,
//! then checks everything the table reports about itself.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use collections::{ChainedHashMap, TableConfig, bucket_index};
use log::{debug, info, trace, warn};

use crate::{
    ReplayError,
    trace::{Command, TraceLine},
};

pub type Table = ChainedHashMap<i32, f32>;
pub type Reference = HashMap<i32, f32>;

/// How far past the upper threshold the dynamic check pushes the table
const OVERFILL: f32 = 1.05;

/// Applies every command to both maps, stopping at the first disagreement
pub fn run_commands(
    table: &mut Table,
    reference: &mut Reference,
    commands: &[TraceLine],
) -> Result<(), ReplayError> {
    for TraceLine { line, command } in commands {
        let line = *line;
        trace!(target: "replay", "line {line}: {command:?}");

        match *command {
            Command::Insert { key, value } => {
                reference.insert(key, value);
                table.insert(key, value);
                // inserting the same pair twice must not change anything
                table.insert(key, value);

                if table.len() != reference.len() {
                    return Err(ReplayError::Mismatch {
                        line,
                        reason: format!(
                            "map has size {} but should have size {}",
                            table.len(),
                            reference.len()
                        ),
                    });
                }
            }
            Command::Remove { key } => {
                let expected = reference.remove(&key).is_some();
                if table.remove(&key) != expected {
                    return Err(ReplayError::Mismatch {
                        line,
                        reason: format!("failed to remove key {key}"),
                    });
                }
            }
            Command::Get { key } => match (table.get(&key), reference.get(&key)) {
                (Some(&got), Some(&want)) if !same_value(got, want) => {
                    return Err(ReplayError::Mismatch {
                        line,
                        reason: format!("map has value={got} for key={key} but expected {want}"),
                    });
                }
                (Some(_), None) => {
                    return Err(ReplayError::Mismatch {
                        line,
                        reason: format!("unexpected key {key} found in map"),
                    });
                }
                (None, Some(_)) => {
                    return Err(ReplayError::Mismatch {
                        line,
                        reason: format!("expected key {key} in map but it wasn't"),
                    });
                }
                _ => {}
            },
            Command::Directive { ref name, .. } => {
                debug!(target: "replay", "line {line}: skipping directive {name}");
            }
        }
    }

    Ok(())
}

/// Outcome of every check run against one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckResults {
    pub basic: bool,
    pub all_keys: bool,
    pub bucket_sizes: bool,
    pub sorted_keys: bool,
    /// `None` when the dynamic capacity check was not requested
    pub dynamic_size: Option<bool>,
}

impl CheckResults {
    pub fn all_passed(&self) -> bool {
        self.basic
            && self.all_keys
            && self.bucket_sizes
            && self.sorted_keys
            && self.dynamic_size.unwrap_or(true)
    }
}

impl fmt::Display for CheckResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn status(ok: bool) -> &'static str {
            if ok { "passed" } else { "failed" }
        }

        writeln!(f, "Basic tests: {}", status(self.basic))?;
        writeln!(f, "Get all keys: {}", status(self.all_keys))?;
        writeln!(f, "Get bucket sizes: {}", status(self.bucket_sizes))?;
        writeln!(f, "Get all sorted keys: {}", status(self.sorted_keys))?;
        if let Some(ok) = self.dynamic_size {
            writeln!(f, "Dynamic size: {}", status(ok))?;
        }
        Ok(())
    }
}

/// Runs every check against `table`, which must hold exactly what
/// `reference` holds.
///
/// The dynamic capacity check mutates the table but puts every pair back
/// before returning.
pub fn verify(table: &mut Table, reference: &Reference, dynamic: bool, label: &str) -> CheckResults {
    let results = CheckResults {
        basic: report(label, "basic", check_pairs(table, reference)),
        // twice, a second enumeration must not see leftovers of the first
        all_keys: report(label, "all keys", check_all_keys(table, reference))
            && report(label, "all keys (again)", check_all_keys(table, reference)),
        bucket_sizes: report(label, "bucket sizes", check_bucket_sizes(table, reference)),
        sorted_keys: report(label, "sorted keys", check_sorted_keys(table, reference)),
        dynamic_size: dynamic
            .then(|| report(label, "dynamic size", check_dynamic_size(table, reference))),
    };

    info!(target: "verify", "{label}: {}", if results.all_passed() { "all checks passed" } else { "some checks failed" });
    results
}

/// Bitwise equality, so a stored NaN matches itself
fn same_value(a: f32, b: f32) -> bool {
    a.to_bits() == b.to_bits()
}

fn report(label: &str, check: &str, result: Result<(), String>) -> bool {
    match result {
        Ok(()) => true,
        Err(reason) => {
            warn!(target: "verify", "{label}: {check} failed: {reason}");
            false
        }
    }
}

fn check_pairs(table: &Table, reference: &Reference) -> Result<(), String> {
    if table.len() != reference.len() {
        return Err(format!(
            "size is {}, expected {}",
            table.len(),
            reference.len()
        ));
    }

    for (key, want) in reference {
        match table.get(key) {
            Some(&got) if same_value(got, *want) => {}
            Some(got) => return Err(format!("key {key} has value {got}, expected {want}")),
            None => return Err(format!("key {key} is missing")),
        }
    }

    Ok(())
}

fn check_all_keys(table: &Table, reference: &Reference) -> Result<(), String> {
    let keys = table.all_keys();
    if keys.len() != reference.len() {
        return Err(format!(
            "got {} keys, expected {}",
            keys.len(),
            reference.len()
        ));
    }

    let unique: BTreeSet<i32> = keys.iter().copied().collect();
    if unique.len() != keys.len() {
        return Err("a key was reported more than once".into());
    }

    match unique.iter().find(|&&k| !reference.contains_key(&k)) {
        Some(k) => Err(format!("invalid key {k} in map")),
        None => Ok(()),
    }
}

/// Predicts every bucket's size from the reference map alone
fn expected_bucket_sizes(table: &Table, reference: &Reference) -> Vec<usize> {
    let mut sizes = vec![0; table.capacity()];
    for key in reference.keys() {
        sizes[bucket_index(table.hasher(), key, table.capacity())] += 1;
    }
    sizes
}

fn check_bucket_sizes(table: &Table, reference: &Reference) -> Result<(), String> {
    let got = table.bucket_sizes();
    let want = expected_bucket_sizes(table, reference);
    if got == want {
        Ok(())
    } else {
        Err(format!("got {got:?}, expected {want:?}"))
    }
}

fn check_sorted_keys(table: &Table, reference: &Reference) -> Result<(), String> {
    let got = table.sorted_keys();
    let mut want: Vec<i32> = reference.keys().copied().collect();
    want.sort_unstable();

    if got == want {
        Ok(())
    } else if !got.is_sorted() {
        Err("keys are not in ascending order".into())
    } else {
        Err(format!("got {} keys, expected {}", got.len(), want.len()))
    }
}

/// The capacity a table at `prev` buckets must have once it holds `items`
fn expected_capacity(config: &TableConfig, prev: usize, items: usize) -> usize {
    let load = items as f32 / prev as f32;
    let next = if load > config.upper_load_factor {
        config.ladder.next_up(prev)
    } else if load < config.lower_load_factor {
        config.ladder.next_down(prev)
    } else {
        None
    };
    next.unwrap_or(prev)
}

/// Runs `op` and checks the table moved along the ladder exactly as the
/// load factor in `config` says it should
fn audited(
    config: &TableConfig,
    table: &mut Table,
    op: impl FnOnce(&mut Table) -> bool,
) -> Result<(), String> {
    let prev = table.capacity();
    if !op(table) {
        return Err("operation unexpectedly had no effect".into());
    }

    let want = expected_capacity(config, prev, table.len());
    if table.capacity() != want {
        return Err(format!(
            "{} items: capacity went {prev} -> {}, expected {want}",
            table.len(),
            table.capacity()
        ));
    }
    Ok(())
}

/// Empties the table, overfills it past the upper threshold of the
/// largest step, empties it again and restores the original pairs,
/// checking every capacity change on the way
fn check_dynamic_size(table: &mut Table, reference: &Reference) -> Result<(), String> {
    if !table.ladder().contains(table.capacity()) {
        return Err(format!("capacity {} is not a ladder step", table.capacity()));
    }
    check_bucket_sizes(table, reference)?;

    let config = table.config().clone();
    let restore = |table: &mut Table| {
        for (&k, &v) in reference {
            table.insert(k, v);
        }
    };

    for key in reference.keys() {
        if let Err(reason) = audited(&config, table, |t| t.remove(key)) {
            restore(table);
            return Err(reason);
        }
    }

    let fill = (config.ladder.max() as f32 * config.upper_load_factor * OVERFILL) as i32 + 1;
    debug!(target: "verify", "dynamic size: filling {fill} keys from capacity {}", table.capacity());

    let mut result = Ok(());
    for key in 0..fill {
        result = audited(&config, table, |t| t.insert(key, key as f32).is_none());
        if result.is_err() {
            break;
        }
    }
    if result.is_ok() {
        let filled: Reference = (0..fill).map(|k| (k, k as f32)).collect();
        result = check_bucket_sizes(table, &filled);
    }

    // walk back down, still leaving the table as we found it on failure
    debug!(target: "verify", "dynamic size: draining {fill} keys from capacity {}", table.capacity());
    for key in 0..fill {
        let removed = if result.is_ok() {
            audited(&config, table, |t| t.remove(&key))
        } else {
            table.remove(&key);
            Ok(())
        };
        if let Err(reason) = removed {
            result = Err(reason);
        }
    }
    restore(table);
    result?;

    check_pairs(table, reference)
}

/// Every check for one trace, against the replayed table and its copies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceReport {
    pub name: String,
    pub default: CheckResults,
    pub copy_constructed: Option<CheckResults>,
    pub assigned: Option<CheckResults>,
}

impl TraceReport {
    pub fn all_passed(&self) -> bool {
        self.default.all_passed()
            && self.copy_constructed.is_none_or(|r| r.all_passed())
            && self.assigned.is_none_or(|r| r.all_passed())
    }
}

impl fmt::Display for TraceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trace file: {}", self.name)?;
        writeln!(f, "Default constructor tests")?;
        writeln!(f, "{}", self.default)?;
        if let Some(r) = &self.copy_constructed {
            writeln!(f, "Copy constructor tests")?;
            writeln!(f, "{r}")?;
        }
        if let Some(r) = &self.assigned {
            writeln!(f, "Assignment tests")?;
            writeln!(f, "{r}")?;
        }
        Ok(())
    }
}

/// Which checks to run after a trace is replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOptions {
    pub copy: bool,
    pub assignment: bool,
    pub dynamic: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            copy: true,
            assignment: true,
            dynamic: true,
        }
    }
}

/// Replays `commands` on a fresh table built from `config` and verifies it
pub fn replay_trace(
    name: &str,
    commands: &[TraceLine],
    config: &TableConfig,
    options: ReplayOptions,
) -> Result<TraceReport, ReplayError> {
    let mut table = Table::with_config(config.clone())?;
    let mut reference = Reference::new();

    run_commands(&mut table, &mut reference, commands)?;
    info!(target: "replay", "{name}: replayed {} lines, {} keys live, capacity {}", commands.len(), table.len(), table.capacity());

    let default = verify(&mut table, &reference, options.dynamic, "default");

    let copy_constructed = options.copy.then(|| {
        let mut copy = table.clone();
        verify(&mut copy, &reference, options.dynamic, "copy")
    });

    let assigned = if options.assignment {
        // assign over a table that already sits above the first ladder step
        let mut assigned = Table::with_config(config.clone())?;
        let junk = (config.ladder.min() as f32 * config.upper_load_factor) as i32 + 1;
        assigned.extend((0..junk).map(|k| (i32::MIN + k, f32::NAN)));
        debug!(target: "replay", "{name}: assigning over {} junk keys at capacity {}", assigned.len(), assigned.capacity());
        assigned.clone_from(&table);
        Some(verify(&mut assigned, &reference, options.dynamic, "assigned"))
    } else {
        None
    };

    Ok(TraceReport {
        name: name.to_string(),
        default,
        copy_constructed,
        assigned,
    })
}
