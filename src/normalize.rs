//! Mapping of raw file paths to logical object names.
//!
//! `file_summary_by_instance` reports one row per open file handle. A busy
//! server has thousands of them (one per table, partition, temporary table,
//! log file ...), so rows are collapsed into a bounded set of logical names
//! before display: `db.table`, `<temp_table>`, `<redo_log>` and so on.
//!
//! Rules are tried in order and the first match wins. Results are memoized
//! per normalizer; the set of distinct file names a server reports is small
//! and stable, so the cache is never evicted.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Replacement for the data directory prefix in unmatched paths.
const DATADIR_PLACEHOLDER: &str = "<datadir>/";

static TABLE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/([^/]+)/([^/]+)\.(?:frm|ibd|MYD|MYI|CSM|CSV|par|sdi)$").unwrap()
});
static TEMP_TABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#sql").unwrap());
static PARTITIONED_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)#[Pp]#.+$").unwrap());

static STATIC_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"/ibdata\d+$", "<ibdata>"),
        (r"/(?:ib_logfile\d+|#ib_redo\d+(?:_tmp)?)$", "<redo_log>"),
        (r"/(?:undo_?\d+|[^/]+\.ibu)$", "<undo_log>"),
        (r"/ibtmp\d+$", "<ibtmp>"),
        (r"relay-bin\.(?:\d{6}|index)$", "<relay_log>"),
        (r"(?:binlog|-bin)\.(?:\d{6}|index)$", "<binlog>"),
        (r"/db\.opt$", "<db_opt>"),
        (r"(?:slowlog|-slow\.log)$", "<slow_log>"),
        (r"/auto\.cnf$", "<auto_cnf>"),
    ]
    .into_iter()
    .map(|(pattern, name)| (Regex::new(pattern).unwrap(), name))
    .collect()
});

static TRAILING_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"[^/]+\.pid$", "<pid_file>"),
        (r"/share/(?:[^/]+/)*errmsg\.sys$", "<errmsg>"),
        (r"/share/(?:[^/]+/)*charsets/Index\.xml$", "<charset>"),
    ]
    .into_iter()
    .map(|(pattern, name)| (Regex::new(pattern).unwrap(), name))
    .collect()
});

/// Server settings the rules depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// `@@datadir`, normally with a trailing slash.
    pub datadir: String,
    /// `@@relay_log`, absolute or relative to the data directory. Empty when
    /// the server is not configured as a replica.
    pub relay_log: String,
}

enum Outcome {
    /// `schema.table` computed from the matched path.
    Table,
    Symbol(&'static str),
}

struct Rule {
    pattern: Regex,
    outcome: Outcome,
}

/// Memoizing file path normalizer.
pub struct ObjectNormalizer {
    datadir: String,
    rules: Vec<Rule>,
    cache: HashMap<String, String>,
}

impl ObjectNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        let datadir = if config.datadir.is_empty() {
            String::new()
        } else {
            let mut d = clean_path(&config.datadir);
            if !d.ends_with('/') {
                d.push('/');
            }
            d
        };

        let mut rules = Vec::with_capacity(STATIC_RULES.len() + TRAILING_RULES.len() + 2);
        rules.push(Rule {
            pattern: TABLE_FILE.clone(),
            outcome: Outcome::Table,
        });
        if let Some(pattern) = relay_log_pattern(&datadir, &config.relay_log) {
            rules.push(Rule {
                pattern,
                outcome: Outcome::Symbol("<relay_log>"),
            });
        }
        rules.extend(STATIC_RULES.iter().map(|(pattern, name)| Rule {
            pattern: pattern.clone(),
            outcome: Outcome::Symbol(name),
        }));
        rules.extend(TRAILING_RULES.iter().map(|(pattern, name)| Rule {
            pattern: pattern.clone(),
            outcome: Outcome::Symbol(name),
        }));

        Self {
            datadir,
            rules,
            cache: HashMap::new(),
        }
    }

    /// Returns the canonical name for `raw`. Never fails: unmatched paths fall
    /// back to the cleaned path with the data directory collapsed.
    pub fn normalize(&mut self, raw: &str) -> String {
        if let Some(name) = self.cache.get(raw) {
            return name.clone();
        }
        let name = self.resolve(raw);
        self.cache.insert(raw.to_string(), name.clone());
        name
    }

    fn resolve(&self, raw: &str) -> String {
        let path = clean_path(raw);

        for rule in &self.rules {
            let Some(caps) = rule.pattern.captures(&path) else {
                continue;
            };
            return match rule.outcome {
                Outcome::Symbol(name) => name.to_string(),
                Outcome::Table => {
                    let schema = &caps[1];
                    let file = &caps[2];
                    if TEMP_TABLE.is_match(file) {
                        "<temp_table>".to_string()
                    } else if let Some(part) = PARTITIONED_TABLE.captures(file) {
                        format!("{}.{}", schema, &part[1])
                    } else {
                        format!("{}.{}", schema, file)
                    }
                }
            };
        }

        match path.strip_prefix(self.datadir.as_str()) {
            Some(rest) if !self.datadir.is_empty() => {
                debug!(path = %raw, "no rule matched file name");
                format!("{}{}", DATADIR_PLACEHOLDER, rest)
            }
            _ => path,
        }
    }

    /// Number of memoized lookups.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

/// Builds the relay log rule: `<relay path>.(NNNNNN|index)`.
fn relay_log_pattern(datadir: &str, relay_log: &str) -> Option<Regex> {
    if relay_log.is_empty() {
        return None;
    }
    let path = if relay_log.starts_with('/') {
        clean_path(relay_log)
    } else {
        clean_path(&format!("{}{}", datadir, relay_log))
    };
    let pattern = format!(r"^{}\.(?:\d{{6}}|index)$", regex::escape(&path));
    Regex::new(&pattern).ok()
}

/// Collapses `//`, `/./` and `dir/../` so paths compare textually.
pub fn clean_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let trailing = path.len() > 1 && path.ends_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            p => parts.push(p),
        }
    }

    let mut out = String::with_capacity(path.len());
    if absolute {
        out.push('/');
    }
    out.push_str(&parts.join("/"));
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    out
}
