use std::collections::HashSet;

/// Result of one image load, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed(String),
}

/// Tracks outstanding image loads for one view.
///
/// `ready` goes from false to true exactly once, when the last outstanding
/// load settles. Failed loads count as settled; their paths are remembered so
/// painting can skip them.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    outstanding: HashSet<String>,
    missing: HashSet<String>,
    ready: bool,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker that needs nothing loaded.
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    /// Queue `paths` for loading. Returns the paths the host must load. With
    /// nothing to load the tracker becomes ready immediately.
    pub fn request<I>(&mut self, paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut queued = Vec::new();
        for path in paths {
            if self.outstanding.insert(path.clone()) {
                queued.push(path);
            }
        }
        if self.outstanding.is_empty() && !self.ready {
            log::info!("no resources to load");
            self.ready = true;
        }
        queued
    }

    /// Record the outcome of a load. Returns true if this settled the last
    /// outstanding load.
    pub fn settle(&mut self, path: &str, outcome: LoadOutcome) -> bool {
        if !self.outstanding.remove(path) {
            log::warn!("load outcome for unrequested resource {path}");
            return false;
        }
        if let LoadOutcome::Failed(reason) = outcome {
            log::error!("error loading image {path}: {reason}");
            self.missing.insert(path.to_string());
        }
        if self.outstanding.is_empty() && !self.ready {
            log::info!("all resources loaded");
            self.ready = true;
            return true;
        }
        false
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_missing(&self, path: &str) -> bool {
        self.missing.contains(path)
    }

    pub fn outstanding(&self) -> impl Iterator<Item = &str> {
        self.outstanding.iter().map(String::as_str)
    }
}
