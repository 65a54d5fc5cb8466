//! Process index: per-pid metadata, child lists and parent path hints

use crate::models::{ProcessMeta, Record};
use crate::normalize::{normalize, TimeParser};
use crate::options::{PtreeOptions, TargetFilter};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Field names read from each record
#[derive(Debug, Clone)]
pub struct FieldMap<'a> {
    pub pid: &'a str,
    pub ppid: &'a str,
    pub path: &'a str,
    pub cmd: &'a str,
    pub time: Option<&'a str>,
    pub time_format: Option<&'a str>,
    pub ppath: Option<&'a str>,
}

impl<'a> FieldMap<'a> {
    pub fn from_options(options: &'a PtreeOptions) -> Self {
        Self {
            pid: options.pid_field.trim(),
            ppid: options.ppid_field.trim(),
            path: options.path_field.trim(),
            cmd: options.cmd_field.trim(),
            time: PtreeOptions::optional_field(&options.time_field),
            time_format: options.time_format.as_deref().filter(|f| !f.is_empty()),
            ppath: PtreeOptions::optional_field(&options.ppath_field),
        }
    }
}

/// Relationships built from one batch of records
#[derive(Debug, Default)]
pub struct ProcessIndex {
    meta: HashMap<String, ProcessMeta>,
    children: HashMap<String, Vec<String>>,
    parent_hints: HashMap<String, String>,
}

impl ProcessIndex {
    /// Build the index from a batch of records
    ///
    /// Records without a pid are skipped. With a strict target filter,
    /// records for the target pid whose path differs are skipped as well.
    pub fn build(records: &[Record], fields: &FieldMap<'_>, filter: Option<&TargetFilter>) -> Self {
        let parser = TimeParser::new(fields.time_format);
        let mut index = ProcessIndex::default();
        let mut seen_children: HashSet<(String, String)> = HashSet::new();
        let mut skipped = 0usize;

        for record in records {
            let pid = normalize(record.get(fields.pid));
            if pid.is_empty() {
                skipped += 1;
                continue;
            }
            let ppid = normalize(record.get(fields.ppid));
            let path = normalize(record.get(fields.path));

            if filter.is_some_and(|f| f.rejects(&pid, &path)) {
                log::debug!("skipping record for pid {} with path {}", pid, path);
                skipped += 1;
                continue;
            }

            let cmd = normalize(record.get(fields.cmd));
            let time = parser.parse(fields.time.and_then(|f| record.get(f)));

            index.insert_meta(
                &pid,
                ProcessMeta {
                    ppid: ppid.clone(),
                    path,
                    cmd,
                    time,
                },
            );

            if ppid.is_empty() {
                continue;
            }
            if let Some(ppath_field) = fields.ppath {
                let hint = normalize(record.get(ppath_field));
                if !hint.is_empty() {
                    index.parent_hints.entry(ppid.clone()).or_insert(hint);
                }
            }
            if seen_children.insert((ppid.clone(), pid.clone())) {
                index.children.entry(ppid).or_default().push(pid);
            }
        }

        log::debug!(
            "indexed {} records: {} processes, {} parents, {} skipped",
            records.len(),
            index.meta.len(),
            index.children.len(),
            skipped
        );
        index
    }

    /// Keep the earliest metadata per pid; equal or missing instants keep the first
    fn insert_meta(&mut self, pid: &str, meta: ProcessMeta) {
        match self.meta.get_mut(pid) {
            None => {
                self.meta.insert(pid.to_string(), meta);
            }
            Some(prior) => {
                if let (Some(old), Some(new)) = (prior.time.instant, meta.time.instant) {
                    if new < old {
                        *prior = meta;
                    }
                }
            }
        }
    }

    /// Metadata for a pid, if any record carried it
    pub fn get(&self, pid: &str) -> Option<&ProcessMeta> {
        self.meta.get(pid)
    }

    pub fn contains(&self, pid: &str) -> bool {
        self.meta.contains_key(pid)
    }

    /// Number of distinct processes
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// All known pids with their metadata, in no particular order
    pub fn processes(&self) -> impl Iterator<Item = (&str, &ProcessMeta)> {
        self.meta.iter().map(|(pid, meta)| (pid.as_str(), meta))
    }

    /// Path hint for a parent that has no record of its own
    pub fn parent_hint(&self, ppid: &str) -> Option<&str> {
        self.parent_hints.get(ppid).map(String::as_str)
    }

    /// Children of `pid` in rendering order
    ///
    /// A child is listed only under the parent named by its retained
    /// metadata, so every pid has at most one place in the tree.
    pub fn sorted_children(&self, pid: &str) -> Vec<&str> {
        let mut kids: Vec<&str> = self
            .children
            .get(pid)
            .map(|kids| {
                kids.iter()
                    .map(String::as_str)
                    .filter(|kid| self.get(kid).map_or(true, |m| m.ppid == pid))
                    .collect()
            })
            .unwrap_or_default();
        kids.sort_by(|a, b| self.compare(a, b));
        kids
    }

    /// Order by creation instant (missing instants last), then by pid text
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let instant = |pid: &str| self.get(pid).and_then(|m| m.time.instant);
        match (instant(a), instant(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.cmp(b))
    }
}
