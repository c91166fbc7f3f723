use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::{MetricRow, check_components, counter_fields};

/// One connection as reported by the processlist.
///
/// Source: `information_schema.processlist`
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ProcessRow {
    pub id: u64,
    pub user: String,
    /// `host:port` for TCP clients, `localhost` for socket clients.
    pub host: String,
    pub db: Option<String>,
    pub command: String,
    /// Seconds in the current state.
    pub time: u64,
    pub state: Option<String>,
    pub info: Option<String>,
}

/// Per-user activity derived from the processlist.
///
/// Unlike the other rows these values describe the present moment, not a
/// lifetime total, so the users view always displays them as-is.
#[derive(Clone, Serialize, Debug, PartialEq, Eq, Default)]
pub struct UserRow {
    pub name: String,
    /// Seconds spent by non-sleeping connections in their current command.
    pub runtime: u64,
    /// Seconds spent sleeping by idle connections.
    pub sleeptime: u64,
    pub connections: u64,
    pub active: u64,
    pub hosts: u64,
    pub dbs: u64,
    pub selects: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub other: u64,
}

impl MetricRow for UserRow {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn primary(&self) -> u64 {
        self.runtime
    }

    counter_fields!(
        runtime,
        sleeptime,
        connections,
        active,
        hosts,
        dbs,
        selects,
        inserts,
        updates,
        deletes,
        other,
    );

    fn invariant_violation(&self) -> Option<String> {
        check_components("connections", self.connections, &[self.active]).or_else(|| {
            check_components(
                "active",
                self.active,
                &[
                    self.selects,
                    self.inserts,
                    self.updates,
                    self.deletes,
                    self.other,
                ],
            )
        })
    }
}

/// Users whose threads are server internals rather than clients.
const INTERNAL_USERS: &[&str] = &["system user", "event_scheduler"];

/// Groups processlist entries by user.
///
/// Sleeping connections add to `sleeptime`; everything else is active and is
/// classified by the leading keyword of the statement text.
pub fn aggregate_processlist(processes: &[ProcessRow]) -> Vec<UserRow> {
    let mut by_user: BTreeMap<&str, (UserRow, HashSet<&str>, HashSet<&str>)> = BTreeMap::new();

    for p in processes {
        if INTERNAL_USERS.contains(&p.user.as_str()) {
            continue;
        }
        let name = if p.user.is_empty() {
            "<unauthenticated>"
        } else {
            p.user.as_str()
        };
        let (row, hosts, dbs) = by_user.entry(name).or_insert_with(|| {
            (
                UserRow {
                    name: name.to_string(),
                    ..UserRow::default()
                },
                HashSet::new(),
                HashSet::new(),
            )
        });

        row.connections += 1;
        hosts.insert(strip_port(&p.host));
        if let Some(db) = p.db.as_deref().filter(|d| !d.is_empty()) {
            dbs.insert(db);
        }

        if p.command.eq_ignore_ascii_case("sleep") {
            row.sleeptime += p.time;
            continue;
        }

        row.runtime += p.time;
        row.active += 1;
        match statement_kind(p.info.as_deref()) {
            StatementKind::Select => row.selects += 1,
            StatementKind::Insert => row.inserts += 1,
            StatementKind::Update => row.updates += 1,
            StatementKind::Delete => row.deletes += 1,
            StatementKind::Other => row.other += 1,
        }
    }

    by_user
        .into_values()
        .map(|(mut row, hosts, dbs)| {
            row.hosts = hosts.len() as u64;
            row.dbs = dbs.len() as u64;
            row
        })
        .collect()
}

fn strip_port(host: &str) -> &str {
    // IPv6 clients are reported as `[::1]:port`
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    host.rsplit_once(':').map_or(host, |(h, _)| h)
}

#[derive(Debug, PartialEq, Eq)]
enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

fn statement_kind(info: Option<&str>) -> StatementKind {
    let Some(info) = info else {
        return StatementKind::Other;
    };
    let keyword = info
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or("");
    if keyword.eq_ignore_ascii_case("select") {
        StatementKind::Select
    } else if keyword.eq_ignore_ascii_case("insert") || keyword.eq_ignore_ascii_case("replace") {
        StatementKind::Insert
    } else if keyword.eq_ignore_ascii_case("update") {
        StatementKind::Update
    } else if keyword.eq_ignore_ascii_case("delete") {
        StatementKind::Delete
    } else {
        StatementKind::Other
    }
}
