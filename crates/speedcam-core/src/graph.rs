//! The undirected AS graph.
//!
//! Nodes are stored once, in a single owning table keyed by `Ia`; neighbor sets
//! hold keys, not copies of neighbor info, so that mutating a node's degree or
//! history is visible through every path that references it — a value-copy-on-insert
//! neighbor map would silently lose in-place mutation the moment a node changed.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bytes::ByteSize;
use crate::error::Error;
use crate::ia::Ia;
use crate::node::{ActivityRecord, NodeInfo};

static ISD_AS_RE: OnceLock<Regex> = OnceLock::new();

fn isd_as_re() -> &'static Regex {
    ISD_AS_RE.get_or_init(|| Regex::new(r"\d+-\d+").expect("static regex is valid"))
}

/// The undirected AS graph: a unique node table plus symmetric neighbor sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkGraph {
    nodes: HashMap<Ia, NodeInfo>,
    edges: HashMap<Ia, HashSet<Ia>>,
    episodes: usize,
}

impl NetworkGraph {
    pub fn new(episodes: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            episodes,
        }
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, ia: Ia) -> bool {
        self.nodes.contains_key(&ia)
    }

    pub fn node(&self, ia: Ia) -> Option<&NodeInfo> {
        self.nodes.get(&ia)
    }

    pub fn node_mut(&mut self, ia: Ia) -> Option<&mut NodeInfo> {
        self.nodes.get_mut(&ia)
    }

    pub fn neighbors(&self, ia: Ia) -> impl Iterator<Item = Ia> + '_ {
        self.edges.get(&ia).into_iter().flatten().copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.values()
    }

    pub fn ias(&self) -> impl Iterator<Item = Ia> + '_ {
        self.nodes.keys().copied()
    }

    /// Add an AS with an empty neighbor set and default info. Errors if already
    /// present.
    pub fn add_as(&mut self, ia: Ia) -> Result<(), Error> {
        if self.nodes.contains_key(&ia) {
            return Err(Error::DuplicateGraphMutation(format!(
                "AS {ia} already exists in graph"
            )));
        }
        self.nodes.insert(ia, NodeInfo::new(ia, self.episodes));
        self.edges.insert(ia, HashSet::new());
        Ok(())
    }

    /// Connect two ASes, incrementing both degrees by one.
    ///
    /// Errors if either is absent, if `u == v` (self-loop), or if they're already
    /// connected (checked on either side).
    pub fn connect(&mut self, u: Ia, v: Ia) -> Result<(), Error> {
        if u == v {
            return Err(Error::InvalidInput(format!(
                "cannot connect AS {u} to itself"
            )));
        }
        if !self.nodes.contains_key(&u) {
            return Err(Error::InvalidInput(format!("AS {u} not present in graph")));
        }
        if !self.nodes.contains_key(&v) {
            return Err(Error::InvalidInput(format!("AS {v} not present in graph")));
        }
        let already = self
            .edges
            .get(&u)
            .is_some_and(|n| n.contains(&v))
            || self.edges.get(&v).is_some_and(|n| n.contains(&u));
        if already {
            return Err(Error::DuplicateGraphMutation(format!(
                "{u} and {v} are already connected"
            )));
        }

        self.edges.entry(u).or_default().insert(v);
        self.edges.entry(v).or_default().insert(u);
        if let Some(info) = self.nodes.get_mut(&u) {
            info.degree += 1;
        }
        if let Some(info) = self.nodes.get_mut(&v) {
            info.degree += 1;
        }
        Ok(())
    }

    /// Like `connect`, but an already-connected pair is treated as a no-op instead
    /// of an error — idempotent at the ingest boundary, where a path announcement
    /// may legitimately repeat an edge; `connect` itself still reports duplicates
    /// to direct callers.
    pub fn connect_idempotent(&mut self, u: Ia, v: Ia) -> Result<(), Error> {
        match self.connect(u, v) {
            Ok(()) | Err(Error::DuplicateGraphMutation(_)) => Ok(()),
            Err(other) => Err(other),
        }
    }

    pub fn add_capacity(&mut self, ia: Ia, capacity: ByteSize) -> Result<(), Error> {
        let info = self
            .nodes
            .get_mut(&ia)
            .ok_or_else(|| Error::InvalidInput(format!("AS {ia} not present in graph")))?;
        info.capacity += capacity;
        Ok(())
    }

    /// Push an activity record into the node's ring. Errors if the node is absent.
    pub fn add_activity(
        &mut self,
        ia: Ia,
        start: DateTime<Utc>,
        duration: ChronoDuration,
        bandwidth: ByteSize,
    ) -> Result<(), Error> {
        let info = self
            .nodes
            .get_mut(&ia)
            .ok_or_else(|| Error::InvalidInput(format!("AS {ia} not present in graph")))?;
        info.activities.push(ActivityRecord {
            start,
            duration,
            bandwidth,
        });
        Ok(())
    }

    /// Extract every `\d+-\d+` token from a path-request string, add any new ASes,
    /// and connect consecutive pairs. Already-connected pairs are tolerated; any
    /// unparsable token or a string with no tokens is an error.
    pub fn handle_path_request(&mut self, request: &str) -> Result<(), Error> {
        let tokens: Vec<&str> = isd_as_re()
            .find_iter(request)
            .map(|m| m.as_str())
            .collect();
        if tokens.is_empty() {
            return Err(Error::InvalidInput(format!(
                "path request has no ISD-AS pairs: '{request}'"
            )));
        }

        let mut ias = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let ia: Ia = token.parse()?;
            ias.push(ia);
        }

        for ia in &ias {
            match self.add_as(*ia) {
                Ok(()) | Err(Error::DuplicateGraphMutation(_)) => {}
                Err(other) => return Err(other),
            }
        }

        for pair in ias.windows(2) {
            self.connect_idempotent(pair[0], pair[1])?;
        }

        Ok(())
    }
}
