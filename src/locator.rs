//! Identifier parsing.
//!
//! Classifies a URL (or bare npm package name) by substring match on the host
//! domain and pulls the owner / project out of fixed path positions:
//!
//! | Input | Host | Owner | Project |
//! |-------|------|-------|---------|
//! | `https://github.com/acme/widget` | repository | `acme` | `widget` |
//! | `https://www.npmjs.com/package/left-pad` | registry | - | `left-pad` |
//! | `https://www.npmjs.com/package/@types/node` | registry | - | `@types/node` |
//! | `https://registry.npmjs.org/left-pad` | registry | - | `left-pad` |
//! | `https://registry.npmjs.org/@types%2Fnode` | registry | - | `@types/node` |
//! | `left-pad` | registry | - | `left-pad` |
//!
//! Parsing is structural only. Malformed input never fails; it produces an
//! identity with empty fields that the fetchers treat as "nothing found".

use crate::models::ResourceIdentity;

const REPO_DOMAIN: &str = "github.com";
const REGISTRY_DOMAINS: [&str; 2] = ["npmjs.com", "npmjs.org"];
// The registry API serves packages from the path root, not under `/package/`.
const REGISTRY_API_HOST: &str = "registry.npmjs.org";

// `https://host/a/b` splits into ["https:", "", "host", "a", "b"].
const HOST_INDEX: usize = 2;
const OWNER_INDEX: usize = 3;
const PROJECT_INDEX: usize = 4;

/// Parse an identifier into a [`ResourceIdentity`].
pub fn locate(identifier: &str) -> ResourceIdentity {
    let trimmed = identifier.trim();
    let path = strip_query(trimmed);

    if path.contains(REPO_DOMAIN) {
        let segments = split_segments(path);
        let owner = segment(&segments, OWNER_INDEX);
        let project = segment(&segments, PROJECT_INDEX);
        let project = project.strip_suffix(".git").unwrap_or(project);
        return ResourceIdentity::repository(owner, project);
    }

    if REGISTRY_DOMAINS.iter().any(|d| path.contains(d)) {
        let segments = split_segments(path);
        let index = if segment(&segments, HOST_INDEX) == REGISTRY_API_HOST {
            OWNER_INDEX
        } else {
            PROJECT_INDEX
        };
        let name = segment(&segments, index);
        if let Some((scope, scoped)) = split_encoded_scope(name) {
            return ResourceIdentity::registry(format!("{}/{}", scope, scoped));
        }
        if name.starts_with('@') {
            let scoped = segment(&segments, index + 1);
            if scoped.is_empty() {
                return ResourceIdentity::registry("");
            }
            return ResourceIdentity::registry(format!("{}/{}", name, scoped));
        }
        return ResourceIdentity::registry(name);
    }

    if is_bare_package_name(path) {
        return ResourceIdentity::registry(path);
    }

    ResourceIdentity::unrecognized()
}

/// `@scope%2Fname` as the registry API spells scoped packages.
fn split_encoded_scope(name: &str) -> Option<(&str, &str)> {
    if !name.starts_with('@') {
        return None;
    }
    let at = name.find("%2F").or_else(|| name.find("%2f"))?;
    let (scope, rest) = (&name[..at], &name[at + 3..]);
    if scope.len() < 2 || rest.is_empty() {
        return None;
    }
    Some((scope, rest))
}

fn strip_query(input: &str) -> &str {
    let end = input.find(['?', '#']).unwrap_or(input.len());
    &input[..end]
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').collect()
}

fn segment<'a>(segments: &[&'a str], index: usize) -> &'a str {
    segments.get(index).copied().unwrap_or("")
}

/// `left-pad`, `lodash.merge`, `@scope/name`. No scheme, no whitespace.
fn is_bare_package_name(input: &str) -> bool {
    if input.is_empty() || input.contains("://") || input.chars().any(char::is_whitespace) {
        return false;
    }

    let valid = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
    };

    match input.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, name)) => valid(scope) && valid(name),
            None => false,
        },
        None => valid(input),
    }
}
