//! SRC_URI expansion into a filename -> URLs map

use std::collections::{HashMap, HashSet};

#[cfg(test)]
use mockall::automock;

use crate::error::MetadataError;
use crate::metadata::SourceLocationMap;

/// Trait for expanding a package's source declaration
#[cfg_attr(test, automock)]
pub trait SourceUriParser: Send + Sync {
    /// Expand `src_uri` for `cpv`.
    ///
    /// With `use_flags` set, only groups whose conditional holds are kept.
    /// With `None`, every conditional group is expanded.
    fn parse<'a>(
        &self,
        cpv: &str,
        src_uri: &str,
        use_flags: Option<&'a HashSet<String>>,
    ) -> Result<SourceLocationMap, MetadataError>;
}

/// Parser for the package manager SRC_URI syntax.
///
/// Supports `flag? ( ... )`, `!flag? ( ... )`, plain groups, `uri -> name`
/// renames and `mirror://name/path` expansion from a mirror table.
#[derive(Debug, Clone, Default)]
pub struct SrcUriParser {
    mirrors: HashMap<String, Vec<String>>,
}

impl SrcUriParser {
    pub fn new(mirrors: HashMap<String, Vec<String>>) -> Self {
        Self { mirrors }
    }

    /// Expand `mirror://name/path` into every configured base URL.
    ///
    /// Unknown mirrors are kept verbatim.
    fn expand_mirror(&self, uri: &str) -> Vec<String> {
        let Some(rest) = uri.strip_prefix("mirror://") else {
            return vec![uri.to_string()];
        };
        let (name, path) = rest.split_once('/').unwrap_or((rest, ""));

        match self.mirrors.get(name) {
            Some(bases) if !bases.is_empty() => bases
                .iter()
                .map(|base| format!("{}/{}", base.trim_end_matches('/'), path))
                .collect(),
            _ => vec![uri.to_string()],
        }
    }
}

struct Walker<'a> {
    cpv: &'a str,
    tokens: Vec<&'a str>,
    pos: usize,
    use_flags: Option<&'a HashSet<String>>,
}

impl<'a> Walker<'a> {
    fn next(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn flag_enabled(&self, flag: &str) -> bool {
        let (negated, name) = match flag.strip_prefix('!') {
            Some(name) => (true, name),
            None => (false, flag),
        };
        match self.use_flags {
            Some(flags) => flags.contains(name) != negated,
            None => true,
        }
    }

    fn unbalanced(&self) -> MetadataError {
        MetadataError::UnbalancedParens {
            cpv: self.cpv.to_string(),
        }
    }

    /// Walk tokens until the closing parenthesis of the current group
    fn walk(
        &mut self,
        parser: &SrcUriParser,
        depth: usize,
        enabled: bool,
        out: &mut SourceLocationMap,
    ) -> Result<(), MetadataError> {
        while let Some(token) = self.next() {
            match token {
                ")" if depth == 0 => return Err(self.unbalanced()),
                ")" => return Ok(()),
                "(" => self.walk(parser, depth + 1, enabled, out)?,
                "->" => {
                    return Err(MetadataError::DanglingArrow {
                        cpv: self.cpv.to_string(),
                    });
                }
                flag if flag.ends_with('?') => {
                    let flag = &flag[..flag.len() - 1];
                    if self.next() != Some("(") {
                        return Err(MetadataError::ConditionalWithoutGroup {
                            cpv: self.cpv.to_string(),
                            flag: flag.to_string(),
                        });
                    }
                    let active = enabled && self.flag_enabled(flag);
                    self.walk(parser, depth + 1, active, out)?;
                }
                uri => {
                    let filename = self.rename_target(uri)?;
                    if enabled {
                        let urls = out.entry(filename).or_default();
                        for url in parser.expand_mirror(uri) {
                            if !urls.contains(&url) {
                                urls.push(url);
                            }
                        }
                    }
                }
            }
        }

        if depth > 0 {
            return Err(self.unbalanced());
        }
        Ok(())
    }

    /// Consume an optional `-> name` and return the file name for `uri`
    fn rename_target(&mut self, uri: &str) -> Result<String, MetadataError> {
        if self.peek() != Some("->") {
            let name = uri.rsplit('/').next().unwrap_or(uri);
            return Ok(name.to_string());
        }
        self.pos += 1;

        match self.next() {
            Some(target) if target == "(" || target == ")" || target == "->" => {
                Err(MetadataError::MissingRenameTarget {
                    cpv: self.cpv.to_string(),
                })
            }
            Some(target) if target.contains('/') => Err(MetadataError::InvalidRenameTarget {
                cpv: self.cpv.to_string(),
                target: target.to_string(),
            }),
            Some(target) => Ok(target.to_string()),
            None => Err(MetadataError::MissingRenameTarget {
                cpv: self.cpv.to_string(),
            }),
        }
    }
}

impl SourceUriParser for SrcUriParser {
    fn parse<'a>(
        &self,
        cpv: &str,
        src_uri: &str,
        use_flags: Option<&'a HashSet<String>>,
    ) -> Result<SourceLocationMap, MetadataError> {
        let mut walker = Walker {
            cpv,
            tokens: src_uri.split_whitespace().collect(),
            pos: 0,
            use_flags,
        };

        let mut out = SourceLocationMap::new();
        walker.walk(self, 0, true, &mut out)?;
        Ok(out)
    }
}
