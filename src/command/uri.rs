//! Expansion of a requested path into the absolute URLs to purge.

/// Expands path fragments against the configured origins and index variants.
///
/// With `B` bases and `S` suffixes every fragment yields `B × (1 + S)` URLs,
/// ordered base-major with the bare fragment ahead of its suffix variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriNormalizer {
    bases: Vec<String>,
    suffixes: Vec<String>,
}

impl UriNormalizer {
    /// Create a normalizer from configured bases and suffixes.
    #[must_use]
    pub fn new(bases: Vec<String>, suffixes: Vec<String>) -> Self {
        Self { bases, suffixes }
    }

    /// Number of URLs produced for each fragment.
    #[must_use]
    pub fn fan_out(&self) -> usize {
        self.bases.len() * (1 + self.suffixes.len())
    }

    /// Expand a single fragment that starts with `/`.
    ///
    /// A fragment that already carries one of the bases is stripped of it
    /// first so the base is never doubled.
    #[must_use]
    pub fn expand(&self, fragment: &str) -> Vec<String> {
        let path = self
            .bases
            .iter()
            .fold(fragment, |path, base| path.strip_prefix(base.as_str()).unwrap_or(path));

        let mut urls = Vec::with_capacity(self.fan_out());
        for base in &self.bases {
            urls.push(format!("{base}{path}"));
            for suffix in &self.suffixes {
                if path.ends_with('/') {
                    urls.push(format!("{base}{path}{suffix}"));
                } else {
                    urls.push(format!("{base}{path}/{suffix}"));
                }
            }
        }
        urls
    }
}
