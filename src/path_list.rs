use parking_lot::Mutex;

use crate::path::Path;

/// An append-only collection of committed paths, guarded by a single
/// mutex. Iteration only happens after all workers have joined; there
/// is no guaranteed ordering among committed paths.
pub struct PathList {
    paths: Mutex<Vec<Path>>,
}

impl PathList {
    pub fn new() -> Self {
        Self {
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn append(&self, path: Path) {
        self.paths.lock().push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }

    /// Consumes the list, returning its paths. Only meaningful after
    /// every worker that could still call `append` has joined.
    pub fn into_vec(self) -> Vec<Path> {
        self.paths.into_inner()
    }
}

impl Default for PathList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_drain() {
        let list = PathList::new();
        list.append(Path::new(vec![0, 1, 2]));
        list.append(Path::new(vec![3, 4]));
        assert_eq!(list.len(), 2);
        let paths = list.into_vec();
        assert_eq!(paths.len(), 2);
    }
}
